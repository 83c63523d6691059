//! Error types for the store crate.
//!
//! Every variant is an infrastructure fault: the database could not be
//! opened, migrated, queried, or returned data that could not be decoded.
//! A reference that resolves to nothing is not an error; it is reported
//! through [`Outcome::NotFound`](crate::Outcome::NotFound).

use std::fmt;
use std::path::PathBuf;

/// Errors from authorization store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The database file could not be opened or created.
    Connection {
        /// Database file that failed to open.
        path: PathBuf,
        /// Error details.
        details: String,
    },
    /// Applying the schema migrations failed.
    Migration {
        /// Error details.
        details: String,
    },
    /// A statement failed, including constraint violations.
    Query {
        /// Store operation that issued the statement.
        operation: &'static str,
        /// Error details.
        details: String,
    },
    /// A row could not be converted into a domain value.
    Decode {
        /// Error details.
        details: String,
    },
    /// The store configuration was invalid or could not be loaded.
    InvalidConfig {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection { path, details } => {
                write!(f, "failed to open database '{}': {details}", path.display())
            }
            Self::Migration { details } => {
                write!(f, "database migration failed: {details}")
            }
            Self::Query { operation, details } => {
                write!(f, "{operation} failed: {details}")
            }
            Self::Decode { details } => {
                write!(f, "failed to decode row: {details}")
            }
            Self::InvalidConfig { details } => {
                write!(f, "invalid store configuration: {details}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Builds a `map_err` adapter that tags a database error with the
/// operation that produced it.
pub(crate) fn query_failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Query {
        operation,
        details: e.to_string(),
    }
}
