// ==========================================
// 智能垃圾桶车队 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束冲突按 SQLite 扩展错误码归类
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 记录错误 =====
    #[error("{entity}(id={id})不存在")]
    NotFound { entity: String, id: String },

    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库忙/被锁定: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 约束错误 =====
    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("检查约束违反: {0}")]
    CheckConstraintViolation(String),

    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 构造 NotFound 错误
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        let (code, detail) = match &err {
            rusqlite::Error::SqliteFailure(code, msg) => (
                *code,
                msg.clone().unwrap_or_else(|| code.to_string()),
            ),
            _ => return RepositoryError::DatabaseQueryError(err.to_string()),
        };

        match code.code {
            ffi::ErrorCode::DatabaseBusy | ffi::ErrorCode::DatabaseLocked => {
                RepositoryError::LockError(detail)
            }
            ffi::ErrorCode::ConstraintViolation => match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    RepositoryError::UniqueConstraintViolation(detail)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(detail),
                ffi::SQLITE_CONSTRAINT_CHECK => RepositoryError::CheckConstraintViolation(detail),
                _ => RepositoryError::DatabaseQueryError(detail),
            },
            ffi::ErrorCode::CannotOpen | ffi::ErrorCode::NotADatabase => {
                RepositoryError::DatabaseConnectionError(detail)
            }
            _ => RepositoryError::DatabaseQueryError(detail),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
