// ==========================================
// 车队维保系统 - 导入提示（非致命）
// ==========================================
// 提示随成功结果一起返回，不阻断导入
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ImportWarning {
    /// 作业编码前缀与当前类别不一致（作业仍归入当前类别）
    CategoryMismatch {
        row: usize,
        code: String,
        code_prefix: String,
        category: String,
    },
    /// 作业在所有区间均不适用
    UnusedActivity { row: usize, code: String },
    /// 无法识别的标记按"适用"处理
    AmbiguousMarkNormalizedToApplies {
        row: usize,
        column: usize,
        token: String,
    },
    /// 区间列的小时或公里无法解析，整列丢弃
    DiscardedInvalidIntervalColumn {
        column: usize,
        hours_token: String,
        km_token: String,
    },
    /// 作业行出现在任何类别行之前，类别取自身编码前缀
    ActivityBeforeCategoryHeader { row: usize, code: String },
}

impl ImportWarning {
    pub fn code(&self) -> &'static str {
        match self {
            ImportWarning::CategoryMismatch { .. } => "CategoryMismatchWarning",
            ImportWarning::UnusedActivity { .. } => "WarnUnusedActivity",
            ImportWarning::AmbiguousMarkNormalizedToApplies { .. } => {
                "AmbiguousMarkNormalizedToApplies"
            }
            ImportWarning::DiscardedInvalidIntervalColumn { .. } => {
                "DiscardedInvalidIntervalColumn"
            }
            ImportWarning::ActivityBeforeCategoryHeader { .. } => "ActivityBeforeCategoryHeader",
        }
    }
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.code())?;
        match self {
            ImportWarning::CategoryMismatch {
                row,
                code,
                code_prefix,
                category,
            } => write!(
                f,
                "行 {}: 作业 {} 的编码前缀 {} 与当前类别 {} 不一致，已归入 {}",
                row, code, code_prefix, category, category
            ),
            ImportWarning::UnusedActivity { row, code } => {
                write!(f, "行 {}: 作业 {} 在所有区间均未标记", row, code)
            }
            ImportWarning::AmbiguousMarkNormalizedToApplies { row, column, token } => write!(
                f,
                "行 {}, 列 {}: 无法识别的标记 '{}' 按适用处理",
                row, column, token
            ),
            ImportWarning::DiscardedInvalidIntervalColumn {
                column,
                hours_token,
                km_token,
            } => write!(
                f,
                "列 {}: 区间表头无法解析 (小时='{}', 公里='{}')，已丢弃",
                column, hours_token, km_token
            ),
            ImportWarning::ActivityBeforeCategoryHeader { row, code } => write!(
                f,
                "行 {}: 作业 {} 出现在任何类别行之前，类别取自编码前缀",
                row, code
            ),
        }
    }
}
