//! Startup configuration loading from file and environment variables.

use scribe_db::DbConfig;
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Connection pool settings, see [`DbConfig`] for the keys.
    #[serde(default)]
    pub database: DbConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "scribe_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where the configuration path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// First command line argument.
    CliArg,
    /// `SCRIBE_CONFIG_PATH`.
    EnvVar,
    /// Neither was given; `config.toml` in the working directory.
    Default,
}

impl ConfigSource {
    /// Label used in the startup log line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CliArg => "cli-arg",
            Self::EnvVar => "env-var",
            Self::Default => "default",
        }
    }
}

/// Picks the configuration file: the CLI argument, then
/// `SCRIBE_CONFIG_PATH`, then `config.toml`. Blank values are skipped.
pub fn resolve_config_path(
    cli_arg: Option<String>,
    var: impl Fn(&str) -> Option<String>,
) -> (String, ConfigSource) {
    let present = |value: &String| !value.trim().is_empty();
    if let Some(path) = cli_arg.filter(present) {
        return (path, ConfigSource::CliArg);
    }
    if let Some(path) = var("SCRIBE_CONFIG_PATH").filter(present) {
        return (path, ConfigSource::EnvVar);
    }
    ("config.toml".to_string(), ConfigSource::Default)
}

/// Parses configuration text without applying environment overrides.
///
/// # Errors
///
/// Returns `ConfigError::Parse` for malformed TOML or mistyped keys.
pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(contents)?)
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SCRIBE_DB_HOST` overrides `database.host`
/// - `SCRIBE_DB_PORT` overrides `database.port`
/// - `SCRIBE_DB_USER` overrides `database.user`
/// - `SCRIBE_DB_PASSWORD` overrides `database.password`
/// - `SCRIBE_DB_NAME` overrides `database.db`
/// - `SCRIBE_DB_MAXSIZE` overrides `database.maxsize`
/// - `SCRIBE_LOG_LEVEL` overrides `logging.level`
/// - `SCRIBE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => parse_config(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("SCRIBE_DB_HOST") {
        config.database.host = host;
    }
    if let Some(port) = var("SCRIBE_DB_PORT") {
        if let Ok(parsed) = port.parse() {
            config.database.port = parsed;
        }
    }
    if let Some(user) = var("SCRIBE_DB_USER") {
        config.database.user = Some(user);
    }
    if let Some(password) = var("SCRIBE_DB_PASSWORD") {
        config.database.password = Some(password);
    }
    if let Some(name) = var("SCRIBE_DB_NAME") {
        config.database.database = Some(name);
    }
    if let Some(max_size) = var("SCRIBE_DB_MAXSIZE") {
        if let Ok(parsed) = max_size.parse() {
            config.database.max_size = parsed;
        }
    }
    if let Some(level) = var("SCRIBE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("SCRIBE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
