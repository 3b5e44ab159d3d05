// ==========================================
// 特殊定尺钢筋采购优化系统 - API层错误类型
// ==========================================
// 职责: 转换 Engine/Repository/Import 错误为用户可解释的错误消息
// 红线: 所有错误信息必须包含显式原因 (可解释性)
// ==========================================

use crate::engine::error::EngineError;
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

    #[error("目录校验失败: {0}")]
    CatalogValidationError(String),

    #[error("无可行方案: {0}")]
    Infeasible(String),

    // ==========================================
    // 审计红线
    // ==========================================
    #[error("修订结果不可变: {0}")]
    ImmutableRevisionViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入/导出错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件导出失败: {0}")]
    ExportError(String),

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
            RepositoryError::ImmutableRevisionViolation(id) => {
                ApiError::ImmutableRevisionViolation(id)
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
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            e @ EngineError::OutOfPolicyRange { .. }
            | e @ EngineError::InvalidGranularity { .. }
            | e @ EngineError::BelowManufacturerMinTonnageForLength { .. } => {
                ApiError::CatalogValidationError(e.to_string())
            }
            e @ EngineError::Infeasible { .. } | e @ EngineError::NoCandidates { .. } => {
                ApiError::Infeasible(e.to_string())
            }
            e @ EngineError::EmptyDemand { .. }
            | e @ EngineError::InconsistentDemand { .. }
            | e @ EngineError::MissingRequiredDate { .. } => ApiError::InvalidInput(e.to_string()),
            e @ EngineError::UnknownManufacturer { .. } => {
                ApiError::BusinessRuleViolation(e.to_string())
            }
            EngineError::InternalError(msg) => ApiError::InternalError(msg),
            EngineError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::ExportError(err.to_string())
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
            entity: "Revision".to_string(),
            id: "R001".to_string(),
        };
        match ApiError::from(repo_err) {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Revision"));
                assert!(msg.contains("R001"));
            }
            other => panic!("期望 NotFound, 实际 {:?}", other),
        }

        let repo_err = RepositoryError::ImmutableRevisionViolation("R002".to_string());
        assert!(matches!(
            ApiError::from(repo_err),
            ApiError::ImmutableRevisionViolation(_)
        ));
    }

    #[test]
    fn test_engine_error_conversion() {
        let err = EngineError::NoCandidates {
            diameter: crate::domain::types::Diameter::D25,
        };
        assert!(matches!(ApiError::from(err), ApiError::Infeasible(_)));

        let err = EngineError::InvalidGranularity { length_mm: 10_805 };
        assert!(matches!(
            ApiError::from(err),
            ApiError::CatalogValidationError(_)
        ));
    }
}
