//! Connection settings for the pool manager.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Connection pool configuration.
///
/// Deserializes from the recognised keys `host`, `port`, `user`,
/// `password`, `db`, `charset`, `autocommit`, `maxsize` and `minsize`, plus
/// the timeout tunables. `user`, `password` and `db` have no defaults;
/// [`DbConfig::validate`] rejects a configuration that lacks any of them.
///
/// The bundled SQLite backend opens `db` as a database file path. The
/// network settings are kept so the pool reports where it believes it is
/// connecting.
#[derive(Clone, Deserialize)]
pub struct DbConfig {
    /// Store host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Store port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user. Required.
    #[serde(default)]
    pub user: Option<String>,

    /// Login password. Required, never logged.
    #[serde(default)]
    pub password: Option<String>,

    /// Database name. Required.
    #[serde(default, rename = "db")]
    pub database: Option<String>,

    /// Connection character set.
    #[serde(default = "default_charset")]
    pub charset: String,

    /// Default commit mode for writes issued through the ORM.
    #[serde(default = "default_autocommit")]
    pub autocommit: bool,

    /// Maximum number of pooled connections.
    #[serde(default = "default_maxsize", rename = "maxsize")]
    pub max_size: u32,

    /// Number of idle connections the pool keeps open.
    #[serde(default = "default_minsize", rename = "minsize")]
    pub min_size: u32,

    /// How long a checkout waits for a free connection, in milliseconds.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Upper bound for one checkout (acquire plus statement), in
    /// milliseconds. Unbounded when absent.
    #[serde(default)]
    pub statement_timeout_ms: Option<u64>,

    /// SQLite busy timeout for lock contention, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_autocommit() -> bool {
    true
}

fn default_maxsize() -> u32 {
    10
}

fn default_minsize() -> u32 {
    1
}

fn default_acquire_timeout_ms() -> u64 {
    30_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: None,
            password: None,
            database: None,
            charset: default_charset(),
            autocommit: default_autocommit(),
            max_size: default_maxsize(),
            min_size: default_minsize(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            statement_timeout_ms: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("database", &self.database)
            .field("charset", &self.charset)
            .field("autocommit", &self.autocommit)
            .field("max_size", &self.max_size)
            .field("min_size", &self.min_size)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .field("statement_timeout_ms", &self.statement_timeout_ms)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

impl DbConfig {
    /// Creates a configuration with the three required settings and
    /// defaults for everything else.
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            database: Some(database.into()),
            ..Self::default()
        }
    }

    /// Checks that required settings are present and the rest are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for an absent `user`, `password` or
    /// `db`, and [`ConfigError::Invalid`] for unusable pool bounds or an
    /// unsupported character set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user.is_none() {
            return Err(ConfigError::Missing("user"));
        }
        if self.password.is_none() {
            return Err(ConfigError::Missing("password"));
        }
        match self.database.as_deref() {
            None => return Err(ConfigError::Missing("db")),
            Some(db) if db.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    key: "db",
                    reason: "must not be empty".to_string(),
                })
            }
            Some(_) => {}
        }
        if self.max_size == 0 {
            return Err(ConfigError::Invalid {
                key: "maxsize",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_size > self.max_size {
            return Err(ConfigError::Invalid {
                key: "minsize",
                reason: format!("{} exceeds maxsize {}", self.min_size, self.max_size),
            });
        }
        self.encoding()?;
        Ok(())
    }

    /// Database path handed to the SQLite backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `db` is not set.
    pub fn database_path(&self) -> Result<&str, ConfigError> {
        self.database.as_deref().ok_or(ConfigError::Missing("db"))
    }

    /// SQLite `PRAGMA encoding` value for the configured character set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for character sets SQLite cannot
    /// store natively.
    pub fn encoding(&self) -> Result<&'static str, ConfigError> {
        match self.charset.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" | "utf8mb4" => Ok("UTF-8"),
            "utf16" | "utf-16" => Ok("UTF-16"),
            other => Err(ConfigError::Invalid {
                key: "charset",
                reason: format!("unsupported character set `{other}`"),
            }),
        }
    }

    /// Checkout wait bound.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Per-checkout execution bound, if configured.
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }
}
