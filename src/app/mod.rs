// ==========================================
// 车队维保系统 - 应用层
// ==========================================
// 职责: 组装共享连接与各 API 实例,供命令行入口调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
