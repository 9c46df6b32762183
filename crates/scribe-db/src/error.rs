//! Error types for the store layer.

use std::time::Duration;

/// Errors raised while validating a [`DbConfig`](crate::DbConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A mandatory connection setting was not supplied.
    #[error("missing required database setting: {0}")]
    Missing(&'static str),

    /// A setting was supplied but cannot be used.
    #[error("invalid database setting `{key}`: {reason}")]
    Invalid {
        /// The configuration key at fault.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Errors that can occur while talking to the store.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The pool was asked to start from an unusable configuration.
    #[error("invalid database configuration: {0}")]
    Config(#[from] ConfigError),

    /// The pool could not be built or a connection could not be checked out
    /// before the acquire timeout.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The statement itself failed (constraint, syntax, I/O).
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The number of `?` placeholders does not match the bound arguments.
    #[error("statement expects {expected} arguments, got {actual}")]
    ParameterCount {
        /// Placeholders found in the statement text.
        expected: usize,
        /// Arguments supplied by the caller.
        actual: usize,
    },

    /// A column value read from the store has no [`Value`](crate::Value) form.
    #[error("unreadable column value: {0}")]
    Value(#[from] ValueError),

    /// The statement mixes numbered markers such as `?1` with the bare `?`
    /// placeholder.
    #[error("numbered placeholder at byte {offset}; use bare `?` markers")]
    NumberedPlaceholder {
        /// Byte offset of the offending `?`.
        offset: usize,
    },

    /// The checkout exceeded the configured statement timeout.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// The awaiting task went away before the statement started.
    #[error("operation cancelled before execution")]
    Cancelled,

    /// The pool has been shut down with [`Database::close`](crate::Database::close).
    #[error("database connection pool is closed")]
    Closed,

    /// The blocking task running the statement panicked.
    #[error("blocking database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A [`Value`](crate::Value) could not be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The value holds a different kind than the target type accepts.
    #[error("expected {expected} value, found {found}")]
    Mismatch {
        /// Kind the target type accepts.
        expected: &'static str,
        /// Kind actually held.
        found: &'static str,
    },

    /// The store returned a column the value model cannot represent.
    #[error("unsupported column value: {0}")]
    Unsupported(&'static str),
}
