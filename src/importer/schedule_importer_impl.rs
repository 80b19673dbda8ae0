// ==========================================
// 车队维保系统 - 保养计划导入器实现
// ==========================================
// 职责: 读取表格 → 纯变换管道 → 一次 upsert
// 红线: 任何致命错误都在 upsert 之前返回，仓储不会看到半成品
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::PlanIdentity;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::grid::CellGrid;
use crate::importer::schedule_importer_trait::{
    GridReader, ScheduleImportResult, ScheduleImporter,
};
use crate::importer::schedule_pipeline::SchedulePipeline;
use crate::repository::PlanRepository;
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// ScheduleImporterImpl - 保养计划导入器
// ==========================================
pub struct ScheduleImporterImpl<R, C>
where
    R: PlanRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    plan_repo: R,

    // 配置读取器
    config: C,

    // 表格读取器
    grid_reader: Box<dyn GridReader>,
}

impl<R, C> ScheduleImporterImpl<R, C>
where
    R: PlanRepository,
    C: ImportConfigReader,
{
    /// 创建导入器
    ///
    /// # 参数
    /// - plan_repo: 计划仓储
    /// - config: 配置读取器
    /// - grid_reader: 表格读取器
    pub fn new(plan_repo: R, config: C, grid_reader: Box<dyn GridReader>) -> Self {
        Self {
            plan_repo,
            config,
            grid_reader,
        }
    }

    pub fn plan_repo(&self) -> &R {
        &self.plan_repo
    }

    /// 读取配置并装配管道
    async fn build_pipeline(&self) -> ImportResult<SchedulePipeline> {
        let config = self.config.load_import_config().await.map_err(|e| {
            error!(error = %e, "读取导入配置失败");
            ImportError::InternalError(format!("读取导入配置失败: {}", e))
        })?;
        SchedulePipeline::new(config)
    }

    /// 纯变换 + 唯一一次落库
    fn run_and_persist(
        &self,
        pipeline: &SchedulePipeline,
        grid: &CellGrid,
        identity: &PlanIdentity,
        start_time: Instant,
    ) -> ImportResult<ScheduleImportResult> {
        // === 步骤 2: 纯变换 ===
        let outcome = pipeline.run(grid, identity).map_err(|e| {
            warn!(code = e.code(), error = %e, "导入被拒绝，未落库");
            e
        })?;

        // === 步骤 3: 唯一一次落库 ===
        let plan_id = self.plan_repo.upsert(&outcome.plan, identity).map_err(|e| {
            error!(error = %e, "计划落库失败");
            ImportError::from(e)
        })?;

        let elapsed_time = start_time.elapsed();
        info!(
            plan_id = %plan_id,
            intervals = outcome.plan.intervals.len(),
            activities = outcome.plan.activities.len(),
            warnings = outcome.warnings.len(),
            elapsed_ms = elapsed_time.as_millis() as u64,
            "保养计划导入完成"
        );

        Ok(ScheduleImportResult {
            plan_id,
            intervals_count: outcome.plan.intervals.len(),
            activities_count: outcome.plan.activities.len(),
            warnings: outcome.warnings,
            elapsed_time,
        })
    }
}

#[async_trait]
impl<R, C> ScheduleImporter for ScheduleImporterImpl<R, C>
where
    R: PlanRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path, identity), fields(identity = %identity))]
    async fn import_from_file(
        &self,
        file_path: &Path,
        identity: &PlanIdentity,
    ) -> ImportResult<ScheduleImportResult> {
        let start_time = Instant::now();
        info!(file_path = %file_path.display(), "开始导入保养计划");

        // 先装配管道，读取时即可按配置上限拒绝超大表格
        let pipeline = self.build_pipeline().await?;

        // === 步骤 1: 读取表格 ===
        let grid = self
            .grid_reader
            .read_grid(file_path, pipeline.limits())
            .map_err(|e| {
                error!(error = %e, "表格读取失败");
                e
            })?;
        debug!(rows = grid.row_count(), cols = grid.col_count(), "表格读取完成");

        self.run_and_persist(&pipeline, &grid, identity, start_time)
    }

    #[instrument(skip(self, grid, identity), fields(identity = %identity))]
    async fn import_grid(
        &self,
        grid: &CellGrid,
        identity: &PlanIdentity,
    ) -> ImportResult<ScheduleImportResult> {
        let start_time = Instant::now();
        let pipeline = self.build_pipeline().await?;
        self.run_and_persist(&pipeline, grid, identity, start_time)
    }
}
