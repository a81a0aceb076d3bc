//! Connection configuration.

use crate::error::{SqlError, SqlResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Database driver kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Driver {
    Postgres,
    Sqlite,
}

impl Driver {
    pub fn as_str(self) -> &'static str {
        match self {
            Driver::Postgres => "pgsql",
            Driver::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Ok(Driver::Postgres),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            other => Err(SqlError::connection(format!("unsupported driver '{other}'"))),
        }
    }
}

impl TryFrom<String> for Driver {
    type Error = SqlError;

    fn try_from(value: String) -> SqlResult<Self> {
        value.parse()
    }
}

/// Parameters needed to open a [`Connection`](crate::Connection).
///
/// Values are passed through to the driver as-is.
#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    pub driver: Driver,
    /// Database name, or a file path / `:memory:` for SQLite.
    pub database: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(driver: Driver, database: impl Into<String>) -> Self {
        Self {
            driver,
            database: database.into(),
            host: default_host(),
            port: None,
            user: String::new(),
            password: String::new(),
        }
    }

    /// PostgreSQL configuration.
    pub fn postgres(database: impl Into<String>) -> Self {
        Self::new(Driver::Postgres, database)
    }

    /// SQLite configuration; `path` may be `:memory:`.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new(Driver::Sqlite, path)
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set user name and password.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Load from `SQLCHAIN_*` environment variables.
    ///
    /// `SQLCHAIN_DRIVER` and `SQLCHAIN_DATABASE` are required; `SQLCHAIN_HOST`,
    /// `SQLCHAIN_PORT`, `SQLCHAIN_USER` and `SQLCHAIN_PASSWORD` are optional.
    pub fn from_env() -> SqlResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SqlResult<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| SqlError::connection(format!("{key} is not set")))
        };

        let driver: Driver = required("SQLCHAIN_DRIVER")?.parse()?;
        let mut config = Self::new(driver, required("SQLCHAIN_DATABASE")?);

        if let Some(host) = lookup("SQLCHAIN_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("SQLCHAIN_PORT") {
            let port = port
                .parse()
                .map_err(|_| SqlError::connection(format!("SQLCHAIN_PORT is not a port: {port}")))?;
            config.port = Some(port);
        }
        if let Some(user) = lookup("SQLCHAIN_USER") {
            config.user = user;
        }
        if let Some(password) = lookup("SQLCHAIN_PASSWORD") {
            config.password = password;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn driver_aliases() {
        assert_eq!("pgsql".parse::<Driver>().unwrap(), Driver::Postgres);
        assert_eq!("PostgreSQL".parse::<Driver>().unwrap(), Driver::Postgres);
        assert_eq!("sqlite3".parse::<Driver>().unwrap(), Driver::Sqlite);
        assert!("mysql".parse::<Driver>().unwrap_err().is_connection());
    }

    #[test]
    fn from_lookup_reads_all_fields() {
        let env: HashMap<&str, &str> = [
            ("SQLCHAIN_DRIVER", "pgsql"),
            ("SQLCHAIN_DATABASE", "app"),
            ("SQLCHAIN_HOST", "db.internal"),
            ("SQLCHAIN_PORT", "5433"),
            ("SQLCHAIN_USER", "app"),
            ("SQLCHAIN_PASSWORD", "secret"),
        ]
        .into_iter()
        .collect();

        let config =
            ConnectionConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.driver, Driver::Postgres);
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, Some(5433));
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn from_lookup_requires_driver() {
        let err = ConnectionConfig::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("SQLCHAIN_DRIVER"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"driver":"sqlite","database":":memory:"}"#).unwrap();
        assert_eq!(config.driver, Driver::Sqlite);
        assert_eq!(config.host, "localhost");
        assert!(config.user.is_empty());
    }

    #[test]
    fn debug_hides_password() {
        let config = ConnectionConfig::postgres("app").credentials("u", "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
