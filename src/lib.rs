// ==========================================
// 车队维保系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 保养计划导入 / 归一化 / 适用矩阵编辑
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 矩阵视图与到期判定
pub mod engine;

// 导入层 - 外部表格
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    Activity, ActivityApplicability, ApplicabilityMatrix, ErrorLocation, Interval, Plan,
    PlanIdentity, PlanSummary,
};

// 导入
pub use importer::{
    CellGrid, CellValue, ImportError, ImportWarning, ScheduleImporter, ScheduleImporterImpl,
    SchedulePipeline,
};

// 引擎
pub use engine::{CellDiff, DenseGrid, DueIntervalResolver, MatrixView};

// 配置
pub use config::{ConfigManager, ImportConfig};

// API
pub use api::{ApiError, ImportApi, MatrixApi, PlanApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队维保系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
