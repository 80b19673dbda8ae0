// ==========================================
// 车队维保系统 - 领域类型定义
// ==========================================
// 职责: 计划身份、单元格坐标等值对象
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计划身份 (Plan Identity)
// ==========================================
// 同一 (vehicle_type, name) 重复导入 → 替换旧修订，保留 plan_id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanIdentity {
    pub vehicle_type: String, // 车型
    pub name: String,         // 计划名称
}

impl PlanIdentity {
    pub fn new(vehicle_type: &str, name: &str) -> Self {
        Self {
            vehicle_type: vehicle_type.trim().to_string(),
            name: name.trim().to_string(),
        }
    }

    /// 车型与名称均非空
    pub fn is_complete(&self) -> bool {
        !self.vehicle_type.is_empty() && !self.name.is_empty()
    }
}

impl fmt::Display for PlanIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vehicle_type, self.name)
    }
}

// ==========================================
// 错误定位 (Error Location)
// ==========================================
// 行列号均为 1 起始，与表格界面一致
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub row: Option<usize>,
    pub column: Option<usize>,
}

impl ErrorLocation {
    pub fn row(row: usize) -> Self {
        Self {
            row: Some(row),
            column: None,
        }
    }

    pub fn cell(row: usize, column: usize) -> Self {
        Self {
            row: Some(row),
            column: Some(column),
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.row, self.column) {
            (Some(r), Some(c)) => write!(f, "行 {}, 列 {}", r, c),
            (Some(r), None) => write!(f, "行 {}", r),
            (None, Some(c)) => write!(f, "列 {}", c),
            (None, None) => write!(f, "-"),
        }
    }
}
