// ==========================================
// 车队维保系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行/上层服务调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod matrix_api;
pub mod plan_api;

// 重导出核心类型
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
pub use matrix_api::{EditRequest, MatrixApi};
pub use plan_api::{NextMaintenanceResponse, PlanApi};
