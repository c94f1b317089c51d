//! # Storage Errors
//!
//! [`DbError`] is what every repository call returns. It carries two kinds
//! of failure: SQLite itself refusing something, and a marketplace rule
//! that was checked while a transaction was open (out of stock, not
//! enough money on the card, an email that is already registered).
//!
//! ```text
//!   sqlx::Error ─────────────► DbError::{UniqueViolation, CheckViolation, ...}
//!   CoreError / Validation ──► DbError::Domain
//!                                   │
//!                                   ▼
//!                          ApiError in the marketplace app
//! ```
//!
//! Callers that only care about the rule use [`DbError::as_domain`].

use lowlow_core::{CoreError, ValidationError};
use thiserror::Error;

/// Failure of a storage call.
#[derive(Debug, Error)]
pub enum DbError {
    /// A lookup by id came back empty.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index refused the write: a repeated email, or a second
    /// default card for the same owner.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// CHECK constraint violation (negative balance or stock).
    #[error("Constraint violated: {0}")]
    CheckViolation(String),

    /// Card, product or order pointing at a missing user.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The database file could not be opened or created.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Timed out waiting for a connection.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Legacy snapshot could not be read.
    #[error("Legacy data error: {0}")]
    Legacy(String),

    /// Business rule failed inside a repository call.
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// `NotFound` for `entity` with `id`.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the business-rule error, if this is one.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            DbError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// SQLite reports constraint failures only as message text, so the
/// variant is picked from the message.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("row", "?"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: users.email"
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
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation(msg.to_string())
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("store is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Legacy(err.to_string())
    }
}

/// Shorthand used by every repository.
pub type DbResult<T> = Result<T, DbError>;
