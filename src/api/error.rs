// ==========================================
// 车队维保系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入/矩阵/仓储错误为带定位的客户端错误
// 约定: 致命导入错误必须携带稳定错误代码与行列定位
// ==========================================

use crate::domain::ErrorLocation;
use crate::engine::MatrixError;
use crate::importer::{ImportError, ImportErrorKind};
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 作业/区间不属于该计划
    #[error("未知引用: {entity}(id={id})不属于该计划")]
    UnknownReference { entity: String, id: String },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 导入错误
    // ==========================================
    /// 导入被拒绝（结构/校验错误），不会产生任何落库
    #[error("导入被拒绝 [{code}] ({location}): {message}")]
    ImportRejected {
        code: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向客户端的结构化错误体
    pub fn to_response(&self) -> ApiErrorResponse {
        match self {
            ApiError::ImportRejected {
                code,
                message,
                location,
            } => ApiErrorResponse {
                code: code.clone(),
                message: message.clone(),
                row: location.row,
                column: location.column,
            },
            other => ApiErrorResponse {
                code: other.code().to_string(),
                message: other.to_string(),
                row: None,
                column: None,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "InvalidInput",
            ApiError::NotFound(_) => "NotFound",
            ApiError::UnknownReference { .. } => "UnknownReferenceError",
            ApiError::BusinessRuleViolation(_) => "BusinessRuleViolation",
            ApiError::ImportRejected { .. } => "ImportRejected",
            ApiError::ImportError(_) => "ImportError",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => "DatabaseError",
            ApiError::ConfigError(_) => "ConfigError",
            ApiError::InternalError(_) | ApiError::Other(_) => "InternalError",
        }
    }
}

/// 客户端错误体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
    pub row: Option<usize>,
    pub column: Option<usize>,
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err.kind() {
            ImportErrorKind::Structural | ImportErrorKind::Validation => ApiError::ImportRejected {
                code: err.code().to_string(),
                message: err.to_string(),
                location: err.location().unwrap_or_default(),
            },
            ImportErrorKind::Source => ApiError::ImportError(err.to_string()),
            ImportErrorKind::Config => ApiError::ConfigError(err.to_string()),
            ImportErrorKind::Internal => match err {
                ImportError::PersistenceError(msg) => ApiError::DatabaseError(msg),
                other => ApiError::InternalError(other.to_string()),
            },
        }
    }
}

// ==========================================
// 从 MatrixError 转换
// ==========================================
impl From<MatrixError> for ApiError {
    fn from(err: MatrixError) -> Self {
        match err {
            MatrixError::UnknownReference { entity, id } => {
                ApiError::UnknownReference { entity, id }
            }
            MatrixError::GridShapeMismatch { message } => ApiError::InvalidInput(message),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_code_maps_to_rejection_with_row() {
        let api_err: ApiError = ImportError::DuplicateActivityCode {
            code: "B.1".to_string(),
            first_row: 5,
            row: 6,
            column: 1,
        }
        .into();
        let body = api_err.to_response();
        assert_eq!(body.code, "DuplicateActivityCodeError");
        assert_eq!(body.row, Some(6));
        assert_eq!(body.column, Some(1));
        assert!(body.message.contains("B.1"));
    }

    #[test]
    fn test_unknown_reference_keeps_its_own_code() {
        let api_err: ApiError = MatrixError::UnknownReference {
            entity: "Interval".to_string(),
            id: "x".to_string(),
        }
        .into();
        assert!(matches!(
            &api_err,
            ApiError::UnknownReference { entity, id } if entity == "Interval" && id == "x"
        ));
        let body = api_err.to_response();
        assert_eq!(body.code, "UnknownReferenceError");
        assert!(body.message.contains("x"));
    }

    #[test]
    fn test_repository_not_found() {
        let api_err: ApiError = RepositoryError::NotFound {
            entity: "MaintenancePlan".to_string(),
            id: "P1".to_string(),
        }
        .into();
        assert!(api_err.to_string().contains("P1"));
    }
}
