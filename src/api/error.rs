// ==========================================
// 租屋管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository / 引擎错误为用户可读的错误消息
// 红线: 分摊引擎错误原样保留（带类型），调用方据此提示使用者修正输入
// ==========================================

use crate::engine::allocation::AllocationError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
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

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 分摊计算失败（输入数据问题）
    #[error("电费分摊失败: {0}")]
    Allocation(#[from] AllocationError),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    Import(#[from] ImportError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定的错误代码（供前端 / CLI 区分）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::Allocation(err) => err.code(),
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::ConfigError(_) => "CONFIG_ERROR",
            ApiError::Import(_) => "IMPORT_ERROR",
            ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// 面向使用者的提示（分摊错误走本地化文案）
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Allocation(err) => err.user_message(),
            other => other.to_string(),
        }
    }
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
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ElectricityPeriod".to_string(),
            id: "42".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ElectricityPeriod"));
                assert!(msg.contains("42"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(api_err.code(), "DATABASE_CONNECTION_ERROR");

        let api_err: ApiError = RepositoryError::ForeignKeyViolation("fk".to_string()).into();
        assert_eq!(api_err.code(), "BUSINESS_RULE_VIOLATION");

        let api_err: ApiError = RepositoryError::DatabaseQueryError("busy".to_string()).into();
        assert_eq!(api_err.code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_allocation_error_keeps_type_and_code() {
        let api_err: ApiError = AllocationError::NegativePublicEnergy { public_kwh: -50.0 }.into();
        assert_eq!(api_err.code(), "NEGATIVE_PUBLIC_ENERGY");
        assert!(matches!(
            api_err,
            ApiError::Allocation(AllocationError::NegativePublicEnergy { public_kwh }) if public_kwh == -50.0
        ));
    }
}
