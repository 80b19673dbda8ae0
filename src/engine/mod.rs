// ==========================================
// 车队维保系统 - 引擎层
// ==========================================
// 职责: 基于已持久化计划的纯计算（矩阵视图 / 到期判定）
// 红线: Engine 不拼 SQL
// ==========================================

pub mod maintenance_due;
pub mod matrix_view;

// 重导出核心引擎
pub use maintenance_due::{DueInterval, DueIntervalResolver};
pub use matrix_view::{
    CategoryGroup, CellDiff, DenseGrid, GridColumn, GridRow, MatrixError, MatrixView,
};
