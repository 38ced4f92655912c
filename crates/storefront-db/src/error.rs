//! # Database Error Types
//!
//! Error types for database operations and for the ledger coordinators.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError (storefront-core)       │
//! │       │                                   │                             │
//! │       ▼                                   │                             │
//! │  DbError ← Adds context and               │                             │
//! │       │    categorization                 │                             │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │  LedgerError::{Persistence, Rejected}                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kind() + user_message() for the caller                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use storefront_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Reusing an idempotency key
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Order item or inbound record referencing a non-existent product
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation.
    ///
    /// ## When This Occurs
    /// - A write would drive `stock_quantity` below zero
    /// - Non-positive quantities, negative prices
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed (begin, commit or a guarded write that matched no row).
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether this is a unique violation on the given column.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.ends_with(column))
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
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: <expr>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
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
// Ledger Error
// =============================================================================

/// Coarse category a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InsufficientStock,
    InvalidTransition,
    NotFound,
    Persistence,
}

/// What a coordinator returns when an operation does not commit.
///
/// Either way the ledger is unchanged: rejections happen before commit and
/// persistence failures roll the atomic unit back.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A business rule refused the operation.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The store failed.
    #[error(transparent)]
    Persistence(#[from] DbError),
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Rejected(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Persistence(DbError::from(err))
    }
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Rejected(err) => match err {
                CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                CoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
                CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) => ErrorKind::NotFound,
                CoreError::ProductInactive { .. }
                | CoreError::AmountOverflow(_)
                | CoreError::Validation(_) => ErrorKind::Validation,
            },
            LedgerError::Persistence(DbError::NotFound { .. }) => ErrorKind::NotFound,
            LedgerError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Message safe to show an end user. Store internals are not leaked.
    pub fn user_message(&self) -> String {
        match self {
            LedgerError::Rejected(err) => err.to_string(),
            LedgerError::Persistence(DbError::NotFound { entity, .. }) => {
                format!("{} not found", entity)
            }
            LedgerError::Persistence(_) => {
                "The operation could not be saved. Please try again.".to_string()
            }
        }
    }

    /// The business rejection, if that is what this is.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            LedgerError::Rejected(err) => Some(err),
            LedgerError::Persistence(_) => None,
        }
    }
}

/// Result type for coordinator operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::OrderStatus;

    #[test]
    fn test_kind_mapping() {
        let err = LedgerError::from(CoreError::InsufficientStock {
            product_id: "p".into(),
            product_name: "Tea".into(),
            available: 1,
            requested: 2,
        });
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(err.user_message(), "Only 1 left of \"Tea\" (requested 2)");

        let err = LedgerError::from(CoreError::InvalidTransition {
            order_id: "o".into(),
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        });
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let err = LedgerError::from(ValidationError::Required {
            field: "phone".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(
            LedgerError::from(CoreError::OrderNotFound("o".into())).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_persistence_message_is_generic() {
        let err = LedgerError::from(DbError::QueryFailed("disk I/O error".into()));
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(!err.user_message().contains("disk"));
        assert!(err.as_core().is_none());
    }

    #[test]
    fn test_unique_violation_column() {
        let err = DbError::duplicate("orders.idempotency_key", "k-1");
        assert!(err.is_unique_violation_on("idempotency_key"));
        assert!(!err.is_unique_violation_on("id"));
    }
}
