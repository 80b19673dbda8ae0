// ==========================================
// 车队维保系统 - 保养计划导入 API
// ==========================================
// 职责: 封装保养计划导入（文件 / 已读取网格）
// 返回: 成功 → 数量统计 + 提示；失败 → 带错误代码与行列定位的错误
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::PlanIdentity;
use crate::importer::{
    CellGrid, ScheduleImportResult, ScheduleImporter, ScheduleImporterImpl, UniversalGridReader,
};
use crate::repository::SqlitePlanRepository;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 计划ID（重新导入时与上次相同）
    pub plan_id: String,
    /// 存活区间数
    pub intervals_count: usize,
    /// 作业数
    pub activities_count: usize,
    /// 非致命提示（已格式化为文本）
    pub warnings: Vec<String>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl From<ScheduleImportResult> for ImportApiResponse {
    fn from(result: ScheduleImportResult) -> Self {
        Self {
            plan_id: result.plan_id,
            intervals_count: result.intervals_count,
            activities_count: result.activities_count,
            warnings: result.warnings.iter().map(|w| w.to_string()).collect(),
            elapsed_ms: result.elapsed_time.as_millis() as i64,
        }
    }
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 导入保养计划文件
    ///
    /// # 参数
    /// - file_path: 文件路径（.xlsx/.xls/.ods/.csv）
    /// - vehicle_type: 车型
    /// - name: 计划名称
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError::ImportRejected): 结构/校验错误（含行列定位），未落库
    pub async fn import_schedule(
        &self,
        file_path: &str,
        vehicle_type: &str,
        name: &str,
    ) -> ApiResult<ImportApiResponse> {
        let identity = Self::identity(vehicle_type, name)?;
        let importer = self.create_importer()?;

        let result = importer
            .import_from_file(Path::new(file_path), &identity)
            .await
            .map_err(|e| {
                warn!(file_path, code = e.code(), error = %e, "保养计划导入失败");
                ApiError::from(e)
            })?;

        Ok(result.into())
    }

    /// 导入已读取的网格（上游已完成表格读取时使用）
    pub async fn import_grid(
        &self,
        grid: &CellGrid,
        vehicle_type: &str,
        name: &str,
    ) -> ApiResult<ImportApiResponse> {
        let identity = Self::identity(vehicle_type, name)?;
        let importer = self.create_importer()?;

        let result = importer.import_grid(grid, &identity).await.map_err(|e| {
            warn!(code = e.code(), error = %e, "保养计划导入失败");
            ApiError::from(e)
        })?;

        Ok(result.into())
    }

    fn identity(vehicle_type: &str, name: &str) -> ApiResult<PlanIdentity> {
        let identity = PlanIdentity::new(vehicle_type, name);
        if !identity.is_complete() {
            return Err(ApiError::InvalidInput(
                "车型与计划名称不能为空".to_string(),
            ));
        }
        Ok(identity)
    }

    /// 创建导入器
    fn create_importer(
        &self,
    ) -> ApiResult<ScheduleImporterImpl<SqlitePlanRepository, ConfigManager>> {
        let plan_repo = SqlitePlanRepository::new(&self.db_path)?;
        let config = ConfigManager::new(&self.db_path)
            .map_err(|e| ApiError::ConfigError(format!("创建配置管理器失败: {}", e)))?;

        Ok(ScheduleImporterImpl::new(
            plan_repo,
            config,
            Box::new(UniversalGridReader),
        ))
    }
}
