//! Error types for sqlchain

use thiserror::Error;

/// Result type alias for sqlchain operations
pub type SqlResult<T> = Result<T, SqlError>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for statement composition and execution
#[derive(Debug, Error)]
pub enum SqlError {
    /// The connection could not be established, or it has been closed
    #[error("Connection error: {0}")]
    Connection(String),

    /// A builder or transaction contract was violated before touching the database
    #[error("Composition error: {0}")]
    Composition(String),

    /// The database rejected the prepared/bound/executed statement
    #[error("Execution error: {message}")]
    Execution {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl SqlError {
    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a composition error
    pub fn composition(message: impl Into<String>) -> Self {
        Self::Composition(message.into())
    }

    /// Create an execution error without an underlying driver error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap a driver error, keeping its diagnostic as the message and the error as the source
    pub fn from_driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Execution {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub fn is_composition(&self) -> bool {
        matches!(self, Self::Composition(_))
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    /// Append a secondary failure (e.g. a failed rollback) to an execution error.
    pub(crate) fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Self::Execution { message, source } => Self::Execution {
                message: format!("{message} ({context})"),
                source,
            },
            other => other,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::Error> for SqlError {
    fn from(err: postgres::Error) -> Self {
        let code = err.as_db_error().map(|db_err| db_err.code().code());
        let message = match err.as_db_error() {
            Some(db_err) => format!("{}: {}", db_err.code().code(), db_err.message()),
            None => err.to_string(),
        };
        let io_failure = std::error::Error::source(&err).is_some_and(|e| e.is::<std::io::Error>());
        if err.is_closed() || io_failure || code.is_some_and(is_connection_lost) {
            return Self::Connection(message);
        }
        Self::Execution {
            message,
            source: Some(Box::new(err)),
        }
    }
}

/// SQLSTATEs meaning the server session is gone: class 08 (connection
/// exception) and the 57P0x shutdown/termination codes.
#[cfg(feature = "postgres")]
fn is_connection_lost(sqlstate: &str) -> bool {
    sqlstate.starts_with("08") || matches!(sqlstate, "57P01" | "57P02" | "57P03")
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for SqlError {
    fn from(err: rusqlite::Error) -> Self {
        Self::from_driver(err)
    }
}

impl From<serde_json::Error> for SqlError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode("<row>", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_context_is_appended() {
        let err = SqlError::execution("no such table: users").with_context("rollback failed: gone");
        assert_eq!(
            err.to_string(),
            "Execution error: no such table: users (rollback failed: gone)"
        );
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn lost_session_states_are_connection_errors() {
        assert!(is_connection_lost("08006"));
        assert!(is_connection_lost("57P01"));
        assert!(!is_connection_lost("23505"));
        assert!(!is_connection_lost("57014"));
    }

    #[test]
    fn context_leaves_other_kinds_alone() {
        let err = SqlError::composition("mode mismatch").with_context("ignored");
        assert_eq!(err.to_string(), "Composition error: mode mismatch");
        assert!(err.is_composition());
    }
}
