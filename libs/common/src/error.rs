//! Database error type shared by the services
//!
//! Every fallible helper in [`crate::database`] reports one of these.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not reach the server
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// A query failed on an established connection
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A schema statement was rejected
    #[error("Schema statement `{statement}` failed: {source}")]
    Schema {
        /// First line of the offending statement
        statement: String,
        #[source]
        source: SqlxError,
    },

    /// Invalid connection settings
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Whether the database itself is unreachable, as opposed to a bad
    /// query or setting
    pub fn is_unavailable(&self) -> bool {
        match self {
            DatabaseError::Connection(_) => true,
            DatabaseError::Query(e) => matches!(
                e,
                SqlxError::Io(_) | SqlxError::PoolTimedOut | SqlxError::PoolClosed
            ),
            _ => false,
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(DatabaseError::Connection(SqlxError::PoolTimedOut).is_unavailable());
        assert!(DatabaseError::Query(SqlxError::PoolClosed).is_unavailable());
        assert!(!DatabaseError::Query(SqlxError::RowNotFound).is_unavailable());
        assert!(!DatabaseError::Configuration("bad url".into()).is_unavailable());
    }

    #[test]
    fn test_schema_message_names_statement() {
        let err = DatabaseError::Schema {
            statement: "CREATE TABLE recipes (".to_string(),
            source: SqlxError::PoolClosed,
        };
        assert!(err.to_string().starts_with("Schema statement `CREATE TABLE recipes (` failed"));
    }
}
