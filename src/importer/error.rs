// ==========================================
// 车队维保系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 来源错误 / 结构错误 / 校验错误 / 配置错误
// 红线: 任一致命错误都中止整次导入，不调用仓储
// ==========================================

use crate::domain::types::ErrorLocation;
use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorKind {
    /// 文件读取 / 格式
    Source,
    /// 表格结构无法识别
    Structural,
    /// 数据校验失败
    Validation,
    /// 导入配置非法
    Config,
    Internal,
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 结构错误 =====
    #[error("未找到保养表头: 在前 {scanned_rows} 行 / {scanned_cols} 列内没有相邻的小时行与公里行")]
    ScheduleHeaderNotFound {
        scanned_rows: usize,
        scanned_cols: usize,
    },

    #[error("保养计划为空: {reason}")]
    EmptySchedule { reason: String },

    #[error("表格过大: {rows} 行 × {cols} 列，上限 {max_rows} 行 × {max_cols} 列")]
    ScheduleTooLarge {
        rows: usize,
        cols: usize,
        max_rows: usize,
        max_cols: usize,
    },

    // ===== 校验错误 =====
    #[error("作业编码重复 (行 {row}, 列 {column}): {code} 已在第 {first_row} 行出现")]
    DuplicateActivityCode {
        code: String,
        first_row: usize,
        row: usize,
        column: usize,
    },

    #[error(
        "区间{field}未严格递增 (行 {row}, 列 {column}): \
         {current} 不大于第 {previous_column} 列的 {previous}"
    )]
    NonMonotonicIntervals {
        field: String,
        row: usize,
        column: usize,
        previous_column: usize,
        previous: f64,
        current: f64,
    },

    #[error("作业行出现在任何类别行之前 (行 {row}, 列 {column}): {code}")]
    OrphanActivityRow {
        row: usize,
        column: usize,
        code: String,
    },

    // ===== 配置错误 =====
    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidConfig {
        key: String,
        value: String,
        message: String,
    },

    // ===== 落库错误 =====
    #[error("计划落库失败: {0}")]
    PersistenceError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 稳定的错误代码（供 API 边界透出）
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::FileNotFound(_) => "FileNotFound",
            ImportError::UnsupportedFormat(_) => "UnsupportedFormat",
            ImportError::FileReadError(_) => "FileReadError",
            ImportError::ExcelParseError(_) => "ExcelParseError",
            ImportError::CsvParseError(_) => "CsvParseError",
            ImportError::ScheduleHeaderNotFound { .. } => "ScheduleHeaderNotFound",
            ImportError::EmptySchedule { .. } => "EmptyScheduleError",
            ImportError::ScheduleTooLarge { .. } => "ScheduleTooLargeError",
            ImportError::DuplicateActivityCode { .. } => "DuplicateActivityCodeError",
            ImportError::NonMonotonicIntervals { .. } => "NonMonotonicIntervalsError",
            ImportError::OrphanActivityRow { .. } => "OrphanActivityRowError",
            ImportError::InvalidConfig { .. } => "InvalidImportConfig",
            ImportError::PersistenceError(_) => "PersistenceError",
            ImportError::InternalError(_) | ImportError::Other(_) => "InternalError",
        }
    }

    pub fn kind(&self) -> ImportErrorKind {
        match self {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_) => ImportErrorKind::Source,
            ImportError::ScheduleHeaderNotFound { .. }
            | ImportError::EmptySchedule { .. }
            | ImportError::ScheduleTooLarge { .. } => ImportErrorKind::Structural,
            ImportError::DuplicateActivityCode { .. }
            | ImportError::NonMonotonicIntervals { .. }
            | ImportError::OrphanActivityRow { .. } => ImportErrorKind::Validation,
            ImportError::InvalidConfig { .. } => ImportErrorKind::Config,
            ImportError::PersistenceError(_)
            | ImportError::InternalError(_)
            | ImportError::Other(_) => ImportErrorKind::Internal,
        }
    }

    /// 行列定位（无定位信息时为 None）
    pub fn location(&self) -> Option<ErrorLocation> {
        match self {
            ImportError::DuplicateActivityCode { row, column, .. }
            | ImportError::OrphanActivityRow { row, column, .. }
            | ImportError::NonMonotonicIntervals { row, column, .. } => {
                Some(ErrorLocation::cell(*row, *column))
            }
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<RepositoryError>
impl From<crate::repository::error::RepositoryError> for ImportError {
    fn from(err: crate::repository::error::RepositoryError) -> Self {
        ImportError::PersistenceError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        let err = ImportError::ScheduleHeaderNotFound {
            scanned_rows: 30,
            scanned_cols: 200,
        };
        assert_eq!(err.kind(), ImportErrorKind::Structural);
        assert_eq!(err.code(), "ScheduleHeaderNotFound");
        assert!(err.location().is_none());

        let err = ImportError::DuplicateActivityCode {
            code: "B.1".to_string(),
            first_row: 5,
            row: 6,
            column: 1,
        };
        assert_eq!(err.kind(), ImportErrorKind::Validation);
        assert_eq!(err.location(), Some(ErrorLocation::cell(6, 1)));
        assert!(err.to_string().contains("B.1"));
    }

    #[test]
    fn test_non_monotonic_carries_cell() {
        let err = ImportError::NonMonotonicIntervals {
            field: "hours".to_string(),
            row: 2,
            column: 5,
            previous_column: 4,
            previous: 300.0,
            current: 200.0,
        };
        assert_eq!(err.location(), Some(ErrorLocation::cell(2, 5)));
        assert_eq!(err.code(), "NonMonotonicIntervalsError");
    }
}
