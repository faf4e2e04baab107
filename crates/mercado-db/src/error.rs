//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                            │
//! │                                                                 │
//! │  SQLite Error (sqlx::Error)                                     │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  DbError (this module) ← Adds context and categorization        │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  Request layer maps kinds to responses:                         │
//! │    Validation → 400   NotFound → 404   EmptyCart → 400          │
//! │    everything else → 500                                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business failures (`EmptyCart`, `Validation`) are distinct variants so
//! callers never have to parse message strings to tell them apart from
//! infrastructure failures.

use thiserror::Error;

use mercado_core::{CoreError, ValidationError};

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Removing a cart line that doesn't exist
    /// - Updating or deleting an absent order
    /// - Listing orders for a user who has none (observed policy)
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Checkout attempted with zero cart lines.
    ///
    /// An explicit business rule, not a generic not-found: the whole
    /// order transaction (header included) is rolled back.
    #[error("Cart is empty for user {user_id}")]
    EmptyCart { user_id: i64 },

    /// Malformed input, caught before any write.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Any UNIQUE index violation; the cart upsert absorbs the
    ///   `(usuario_id, producto_id)` conflict, so seeing this one
    ///   means some other index fired
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Adding a cart line for a non-existent user or product
    /// - Inserting an order line referencing a deleted product
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed to begin, commit, or roll back.
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
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// True for business failures the caller caused, as opposed to
    /// infrastructure failures worth retrying or alerting on.
    pub fn is_business_error(&self) -> bool {
        matches!(
            self,
            DbError::NotFound { .. } | DbError::EmptyCart { .. } | DbError::Validation(_)
        )
    }
}

/// Convert core business errors to DbError.
///
/// The order coordinator runs core logic (pricing, validation) inside its
/// transaction; their failures surface through the same error type.
impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart { user_id } => DbError::EmptyCart { user_id },
            CoreError::Validation(v) => DbError::Validation(v),
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
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE: "UNIQUE constraint failed: <table>.<column>"
                // FK:     "FOREIGN KEY constraint failed"
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
