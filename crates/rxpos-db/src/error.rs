//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├──────────────────────────┐                                      │
//! │       ▼                          ▼                                      │
//! │  SaleError::Storage         ApiError (rxpos-server)                    │
//! │  (sale transaction)         409 / 500 + envelope                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rxpos_core::CoreError;
use sqlx::error::ErrorKind;
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
    /// - UPDATE/DELETE by id affected zero rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate barcode
    /// - Inserting a duplicate customer phone
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a product that sale lines still reference (RESTRICT)
    /// - Referencing a non-existent product_id from a sale line
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, sell < buy, ...).
    #[error("Constraint violation: {0}")]
    CheckViolation(String),

    /// The guarded stock decrement matched no row: the product's stock is
    /// below the amount being taken.
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: String, requested: i64 },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Pool already closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed (begin/commit).
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

    /// True for failures caused by the data (conflicts), as opposed to the
    /// storage engine being unavailable or broken.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → by ErrorKind (unique / foreign key / check)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
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
                let msg = db_err.message().to_string();

                match db_err.kind() {
                    // "UNIQUE constraint failed: products.barcode"
                    ErrorKind::UniqueViolation => {
                        let field = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .and_then(|col| col.rsplit('.').next())
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation {
                            field,
                            value: "unknown".to_string(),
                        }
                    }
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message: msg },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::CheckViolation(msg)
                    }
                    // ON DELETE RESTRICT fails with SQLITE_CONSTRAINT_TRIGGER (1811),
                    // which sqlx reports as ErrorKind::Other.
                    _ if is_foreign_key_message(&msg) => {
                        DbError::ForeignKeyViolation { message: msg }
                    }
                    _ => DbError::QueryFailed(msg),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

fn is_foreign_key_message(msg: &str) -> bool {
    msg.starts_with("FOREIGN KEY constraint failed")
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Sale Error
// =============================================================================

/// Failure of the sale transaction.
///
/// ```text
/// SaleError
/// ├── Domain(CoreError)   ← client can fix: unknown product, stock, input
/// └── Storage(DbError)    ← storage failed; nothing was written
/// ```
///
/// Either way the transaction was rolled back.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<sqlx::Error> for SaleError {
    fn from(err: sqlx::Error) -> Self {
        SaleError::Storage(err.into())
    }
}

impl From<rxpos_core::ValidationError> for SaleError {
    fn from(err: rxpos_core::ValidationError) -> Self {
        SaleError::Domain(err.into())
    }
}

/// Result type for the sale recorder.
pub type SaleResult<T> = Result<T, SaleError>;
