// ==========================================
// 车队维保系统 - 保养计划导入配置
// ==========================================
// 职责: 扫描窗口 / 表格列位置 / 数值约定 / 标记词表 / 孤儿作业策略
// 红线: 数值约定与标记词表必须显式配置，不做逐格推断
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// 数值约定 (Number Convention)
// ==========================================
// DECIMAL_COMMA: "1.500,5" = 1500.5（默认）
// DECIMAL_POINT: "1,500.5" = 1500.5
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NumberConvention {
    #[default]
    DecimalComma,
    DecimalPoint,
}

impl NumberConvention {
    /// (千分位分隔符, 小数分隔符)
    pub fn separators(self) -> (char, char) {
        match self {
            NumberConvention::DecimalComma => ('.', ','),
            NumberConvention::DecimalPoint => (',', '.'),
        }
    }

    pub fn from_config_value(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "DECIMAL_COMMA" => Some(NumberConvention::DecimalComma),
            "DECIMAL_POINT" => Some(NumberConvention::DecimalPoint),
            _ => None,
        }
    }
}

// ==========================================
// 孤儿作业策略
// ==========================================
// 作业行出现在任何类别行之前时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrphanActivityPolicy {
    /// 接受，类别取自身编码前缀，并给出提示
    #[default]
    Tolerate,
    /// 视为致命错误
    Reject,
}

impl OrphanActivityPolicy {
    pub fn from_config_value(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "TOLERATE" => Some(OrphanActivityPolicy::Tolerate),
            "REJECT" => Some(OrphanActivityPolicy::Reject),
            _ => None,
        }
    }
}

// ==========================================
// 标记词表 (Mark Vocabulary)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkVocabulary {
    pub true_tokens: Vec<String>,
    pub false_tokens: Vec<String>,
}

impl Default for MarkVocabulary {
    fn default() -> Self {
        Self {
            true_tokens: ["√", "v", "x", "1", "yes", "si", "sí"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            false_tokens: ["", "-", "0", "no"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ==========================================
// ImportConfig - 导入配置全集
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 表格最大行数（超出 → ScheduleTooLarge）
    pub max_rows: usize,
    /// 表格最大列数（超出 → ScheduleTooLarge）
    pub max_cols: usize,
    /// 表头扫描窗口行数
    pub header_scan_rows: usize,
    /// 表头扫描窗口列数
    pub header_scan_cols: usize,
    /// 作业编码列（1 起始）
    pub code_column: usize,
    /// 作业描述列（1 起始）
    pub description_column: usize,
    /// 连续空行数达到该值视为表格结束
    pub blank_rows_end_of_table: usize,
    pub number_convention: NumberConvention,
    pub hours_suffixes: Vec<String>,
    pub km_suffixes: Vec<String>,
    pub mark_vocabulary: MarkVocabulary,
    pub orphan_activity_policy: OrphanActivityPolicy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows: 2_000,
            max_cols: 200,
            header_scan_rows: 30,
            header_scan_cols: 200,
            code_column: 1,
            description_column: 2,
            blank_rows_end_of_table: 3,
            number_convention: NumberConvention::default(),
            hours_suffixes: ["horas", "hrs", "hr", "hs", "h"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            km_suffixes: ["kms", "km"].iter().map(|s| s.to_string()).collect(),
            mark_vocabulary: MarkVocabulary::default(),
            orphan_activity_policy: OrphanActivityPolicy::default(),
        }
    }
}

impl ImportConfig {
    /// 区间候选列从编码/描述列之后开始
    pub fn first_interval_column(&self) -> usize {
        self.code_column.max(self.description_column) + 1
    }

    /// 校验配置自洽性
    pub fn validate(&self) -> ImportResult<()> {
        let positive = [
            ("max_rows", self.max_rows),
            ("max_cols", self.max_cols),
            ("header_scan_rows", self.header_scan_rows),
            ("header_scan_cols", self.header_scan_cols),
            ("code_column", self.code_column),
            ("description_column", self.description_column),
            ("blank_rows_end_of_table", self.blank_rows_end_of_table),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(invalid(key, &value.to_string(), "必须大于 0"));
            }
        }

        if self.code_column == self.description_column {
            return Err(invalid(
                "description_column",
                &self.description_column.to_string(),
                "不能与 code_column 相同",
            ));
        }

        if self.header_scan_rows < 2 {
            return Err(invalid(
                "header_scan_rows",
                &self.header_scan_rows.to_string(),
                "至少需要 2 行才能容纳小时/公里表头",
            ));
        }

        if self.hours_suffixes.iter().all(|s| s.trim().is_empty()) {
            return Err(invalid("hours_suffixes", "", "至少需要一个小时单位后缀"));
        }
        if self.km_suffixes.iter().all(|s| s.trim().is_empty()) {
            return Err(invalid("km_suffixes", "", "至少需要一个公里单位后缀"));
        }

        let true_set: HashSet<String> = self
            .mark_vocabulary
            .true_tokens
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect();
        if true_set.contains("") {
            return Err(invalid("mark_true_tokens", "", "空白不能作为适用标记"));
        }
        if let Some(overlap) = self
            .mark_vocabulary
            .false_tokens
            .iter()
            .map(|t| t.trim().to_lowercase())
            .find(|t| true_set.contains(t))
        {
            return Err(invalid(
                "mark_false_tokens",
                &overlap,
                "同一标记不能同时出现在适用与不适用词表中",
            ));
        }

        Ok(())
    }
}

fn invalid(key: &str, value: &str, message: &str) -> ImportError {
    ImportError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
