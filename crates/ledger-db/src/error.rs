//! # Ledger Error Types
//!
//! Storage errors and the unified error every ledger operation returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Domain rule (ledger-core)          │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError ← constraint classification   CoreError                        │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │  LedgerError ← what Ledger methods return; any Err rolls back the       │
//! │       │        enclosing database transaction                           │
//! │       ▼                                                                 │
//! │  ErrorResponse { code: "INSUFFICIENT_STOCK", message: "..." }           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use ledger_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Database operation errors.
///
/// These wrap sqlx errors and classify the SQLite failures callers care
/// about (missing rows, constraint violations).
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Second conversion for the same (product, source, target, branch)
    /// - Duplicate branch name
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Line item referencing a product that does not exist
    /// - Deleting a purchase that still has returns pointing at it
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g. stock below zero slipping past the
    /// engine).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>, ..."
                //   "FOREIGN KEY constraint failed"
                //   "CHECK constraint failed: <expr>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Ledger Errors
// =============================================================================

/// Error returned by every ledger operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A business rule rejected the request.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed underneath us.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Storage(err.into())
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Core(err.into())
    }
}

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InsufficientStock,
    ReturnExceedsOriginal,
    QuotaExceeded,
    Conflict,
    StorageFailure,
}

impl ErrorKind {
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorKind::ReturnExceedsOriginal => "RETURN_EXCEEDS_ORIGINAL",
            ErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::StorageFailure => "STORAGE_FAILURE",
        }
    }
}

/// What a caller receives when an operation fails.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for PRD-1: available 5, requested 6" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorKind,
    pub message: String,
}

impl LedgerError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::Core(CoreError::not_found(entity, id))
    }

    /// Category of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Core(err) => match err {
                CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
                CoreError::NotFound { .. } => ErrorKind::NotFound,
                CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                CoreError::ReturnExceedsOriginal { .. } => ErrorKind::ReturnExceedsOriginal,
                CoreError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
                CoreError::Conflict { .. } => ErrorKind::Conflict,
            },
            LedgerError::Storage(err) => match err {
                DbError::NotFound { .. } => ErrorKind::NotFound,
                DbError::UniqueViolation { .. } => ErrorKind::Conflict,
                _ => ErrorKind::StorageFailure,
            },
        }
    }

    /// Serializable `{code, message}` payload.
    ///
    /// Storage internals are logged, not echoed back to the caller.
    pub fn to_response(&self) -> ErrorResponse {
        let code = self.kind();
        let message = match self {
            LedgerError::Storage(DbError::NotFound { .. })
            | LedgerError::Storage(DbError::UniqueViolation { .. }) => self.to_string(),
            LedgerError::Storage(err) => {
                tracing::error!(error = %err, "Storage failure");
                "Database operation failed".to_string()
            }
            LedgerError::Core(err) => err.to_string(),
        };
        ErrorResponse { code, message }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err: LedgerError = CoreError::InsufficientStock {
            product_id: "PRD-1".into(),
            available: 5,
            requested: 6,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        let err: LedgerError = ValidationError::Required {
            field: "product_id".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = LedgerError::not_found("Header", "SAL-1");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_storage_errors_map_to_codes() {
        let err: LedgerError = DbError::duplicate("unit_conversions", "x").into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: LedgerError = DbError::PoolExhausted.into();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert_eq!(err.to_response().message, "Database operation failed");
    }

    #[test]
    fn test_response_serializes_screaming_code() {
        let err: LedgerError = CoreError::QuotaExceeded {
            branch_id: "BR-1".into(),
        }
        .into();
        let json = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(json["code"], "QUOTA_EXCEEDED");
        assert_eq!(ErrorKind::QuotaExceeded.code(), "QUOTA_EXCEEDED");
    }
}
