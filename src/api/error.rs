// ==========================================
// NSPIRE 合规系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// ==========================================

use crate::repository::error::RepositoryError;
use serde::Serialize;
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

    #[error("资源已存在: {0}")]
    AlreadyExists(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 配置错误
    // ==========================================
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

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::AlreadyExists(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

impl ApiError {
    /// 错误代码（供前端/CLI 展示）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::AlreadyExists(_) => "ALREADY_EXISTS",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::ConfigError(_) => "CONFIG_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 转换为错误响应
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// 错误响应
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// API Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_conversion() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "DeficiencyItem".to_string(),
            id: "DEF_404".to_string(),
        }
        .into();
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.to_string().contains("DEF_404"));
    }

    #[test]
    fn test_unique_conversion() {
        let err: ApiError = RepositoryError::UniqueConstraintViolation("dup".to_string()).into();
        let response = err.to_response();
        assert_eq!(response.code, "ALREADY_EXISTS");
    }
}
