// ==========================================
// 车队维保系统 - 领域模型层
// ==========================================
// 职责: 定义保养计划实体与值对象
// 红线: 不含数据访问逻辑,不含导入启发式
// ==========================================

pub mod plan;
pub mod types;

// 重导出核心类型
pub use plan::{
    code_prefix, Activity, ActivityApplicability, ApplicabilityMatrix, Interval, Plan,
    PlanSummary,
};
pub use types::{ErrorLocation, PlanIdentity};
