//! Store plumbing for the Scribe ORM.
//!
//! Provides the connection pool manager (via `r2d2`), the query executor
//! that runs parameterised SQL on pooled connections, and the runtime value
//! and row types that cross the boundary between the store and record code.
//!
//! # Design decisions
//!
//! - **Explicit pool handle**: a [`Database`] is created by
//!   [`Database::connect`] and passed by reference to every query. There is
//!   no process-wide pool; cloning the handle shares the same pool.
//! - **Blocking driver, async surface**: `rusqlite` is synchronous, so every
//!   checkout runs inside `tokio::task::spawn_blocking`. The awaiting task
//!   suspends without blocking other tasks, and the pool's `max_size` bounds
//!   how many statements run at once.
//! - **Scoped checkout**: a connection never outlives the closure handed to
//!   [`Database::with_connection`]. Dropping the awaiting future interrupts
//!   the running statement and the connection still goes back to the pool.
//! - **Store-agnostic placeholders**: statements use `?`, translated into
//!   SQLite's numbered `?N` markers right before execution.

mod config;
mod error;
mod executor;
pub mod placeholder;
mod pool;
mod value;

pub use config::DbConfig;
pub use error::{ConfigError, DbError, ValueError};
pub use pool::{Database, DbPool, PoolStatus};
pub use value::{FromValue, Row, Value};

/// Re-export so callers of [`Database::with_connection`] can name the
/// connection type without depending on `rusqlite` directly.
pub use rusqlite::Connection;
