// ==========================================
// 车队维保系统 - 保养计划导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// 红线: 导入 = 纯变换 (grid → Plan) + 一次仓储 upsert
// ==========================================

use crate::domain::PlanIdentity;
use crate::importer::error::ImportResult;
use crate::importer::grid::{CellGrid, GridLimits};
use crate::importer::warning::ImportWarning;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ==========================================
// ScheduleImportResult - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleImportResult {
    /// 落库后的计划ID（重新导入时沿用原ID）
    pub plan_id: String,
    pub intervals_count: usize,
    pub activities_count: usize,
    pub warnings: Vec<ImportWarning>,
    pub elapsed_time: Duration,
}

// ==========================================
// ScheduleImporter Trait
// ==========================================
// 实现者: ScheduleImporterImpl
#[async_trait]
pub trait ScheduleImporter: Send + Sync {
    /// 从文件导入保养计划
    ///
    /// # 参数
    /// - file_path: 表格文件（.xlsx/.xls/.ods/.csv）
    /// - identity: 车型 + 计划名称
    ///
    /// # 返回
    /// - Ok(ScheduleImportResult): 计划ID、数量统计、提示列表
    /// - Err(ImportError): 致命错误（不会调用仓储）
    ///
    /// # 流程
    /// 1. 读取表格 → CellGrid
    /// 2. 纯变换 → Plan + 提示
    /// 3. PlanRepository.upsert（唯一一次落库）
    async fn import_from_file(
        &self,
        file_path: &Path,
        identity: &PlanIdentity,
    ) -> ImportResult<ScheduleImportResult>;

    /// 从已读取的网格导入（跳过文件读取）
    async fn import_grid(
        &self,
        grid: &CellGrid,
        identity: &PlanIdentity,
    ) -> ImportResult<ScheduleImportResult>;
}

// ==========================================
// GridReader Trait
// ==========================================
// 用途: 表格文件 → 矩形网格
// 实现者: CsvGridReader, ExcelGridReader, UniversalGridReader
pub trait GridReader: Send + Sync {
    /// 读取第一个工作表为 CellGrid（1 起始坐标）
    ///
    /// 实现者必须在分配网格之前按 limits 检查表格范围
    ///
    /// # 错误
    /// - FileNotFound / UnsupportedFormat / ExcelParseError / CsvParseError
    /// - ScheduleTooLarge: 行数或列数超过 limits
    fn read_grid(&self, file_path: &Path, limits: GridLimits) -> ImportResult<CellGrid>;
}
