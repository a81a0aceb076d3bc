//! Concrete [`Session`] implementations, selected by [`Driver`].

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use self::postgres::PgSession;
#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteSession;

use crate::config::{ConnectionConfig, Driver};
use crate::connection::Session;
use crate::error::{SqlError, SqlResult};

/// Establish a session for `config.driver`.
pub(crate) fn connect(config: &ConnectionConfig) -> SqlResult<Box<dyn Session>> {
    match config.driver {
        #[cfg(feature = "postgres")]
        Driver::Postgres => Ok(Box::new(PgSession::connect(config)?)),
        #[cfg(feature = "sqlite")]
        Driver::Sqlite => Ok(Box::new(SqliteSession::open(&config.database)?)),
        #[allow(unreachable_patterns)]
        other => Err(SqlError::connection(format!(
            "driver '{other}' is not enabled in this build"
        ))),
    }
}
