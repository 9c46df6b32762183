//! Connection pool creation, scoped checkout and shutdown.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, InterruptHandle, OpenFlags};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::DbConfig;
use crate::error::DbError;

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Open connections, idle or checked out.
    pub connections: u32,
    /// Connections sitting idle in the pool.
    pub idle: u32,
    /// Configured upper bound.
    pub max_size: u32,
}

impl PoolStatus {
    /// Connections currently checked out.
    pub fn in_use(&self) -> u32 {
        self.connections.saturating_sub(self.idle)
    }
}

/// Handle to the connection pool.
///
/// Cheap to clone; every clone shares the same pool and the same closed
/// flag.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    pool: Mutex<Option<DbPool>>,
    max_size: u32,
    autocommit: bool,
    acquire_timeout: Duration,
    statement_timeout: Option<Duration>,
    closed: AtomicBool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("status", &self.status())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Builds the r2d2 pool described by `config`.
///
/// Each new connection gets the configured encoding, WAL journaling,
/// foreign keys and busy timeout.
///
/// # Errors
///
/// Returns `DbError::Config` for an invalid configuration and
/// `DbError::Pool` if the initial connections cannot be opened.
pub fn create_pool(config: &DbConfig) -> Result<DbPool, DbError> {
    config.validate()?;
    let encoding = config.encoding()?;
    let busy_timeout_ms = config.busy_timeout_ms;

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(config.database_path()?)
        .with_flags(flags)
        .with_init(move |conn| {
            // Encoding only takes effect before the file is first written,
            // so it has to precede the journal mode switch. The busy timeout
            // goes first too: connections opened side by side race for the
            // WAL switch.
            conn.execute_batch(&format!(
                "PRAGMA encoding = '{encoding}';
                 PRAGMA busy_timeout = {busy_timeout_ms};"
            ))?;
            let journal_mode: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            if journal_mode != "wal" && journal_mode != "memory" {
                return Err(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                    Some(format!(
                        "failed to set WAL journal mode, got: {}",
                        journal_mode
                    )),
                ));
            }
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

    let pool = Pool::builder()
        .max_size(config.max_size)
        .min_idle(Some(config.min_size))
        .connection_timeout(config.acquire_timeout())
        .build(manager)?;

    Ok(pool)
}

impl Database {
    /// Creates the pool. Call once at startup and share the handle.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Config` when a required setting is missing and
    /// `DbError::Pool` when the store cannot be opened.
    pub async fn connect(config: DbConfig) -> Result<Self, DbError> {
        config.validate()?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            user = config.user.as_deref().unwrap_or_default(),
            database = config.database.as_deref().unwrap_or_default(),
            max_size = config.max_size,
            min_size = config.min_size,
            "create database connection pool..."
        );

        let settings = config.clone();
        let pool = tokio::task::spawn_blocking(move || create_pool(&settings)).await??;

        tracing::info!("connection pool created");
        Ok(Self::from_pool(pool, &config))
    }

    /// Wraps an already built pool, taking runtime settings from `config`.
    pub fn from_pool(pool: DbPool, config: &DbConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_size: pool.max_size(),
                pool: Mutex::new(Some(pool)),
                autocommit: config.autocommit,
                acquire_timeout: config.acquire_timeout(),
                statement_timeout: config.statement_timeout(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Default commit mode for writes issued by the ORM.
    pub fn autocommit(&self) -> bool {
        self.inner.autocommit
    }

    fn pool(&self) -> Option<DbPool> {
        self.inner
            .pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current pool occupancy. All zero once the pool has been torn down.
    pub fn status(&self) -> PoolStatus {
        let (connections, idle) = match self.pool() {
            Some(pool) => {
                let state = pool.state();
                (state.connections, state.idle_connections)
            }
            None => (0, 0),
        };
        PoolStatus {
            connections,
            idle,
            max_size: self.inner.max_size,
        }
    }

    /// Whether [`Database::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Shuts the pool down.
    ///
    /// New operations fail with [`DbError::Closed`] from now on. Waits up to
    /// the acquire timeout for checked-out connections to come back, then
    /// drops the pool, closing every idle connection. Calling it again is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Timeout` when connections were still checked out
    /// at the deadline. The pool is dropped anyway; those connections close
    /// as soon as their statements finish.
    pub async fn close(&self) -> Result<(), DbError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::info!("closing database connection pool");

        let limit = self.inner.acquire_timeout;
        let deadline = tokio::time::Instant::now() + limit;
        let mut in_use = self.status().in_use();
        while in_use > 0 && tokio::time::Instant::now() < deadline {
            tracing::debug!(in_use, "waiting for connections to return");
            tokio::time::sleep(Duration::from_millis(10)).await;
            in_use = self.status().in_use();
        }

        let pool = self
            .inner
            .pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(pool);

        if in_use > 0 {
            tracing::warn!(in_use, timeout = ?limit, "closed pool with connections still checked out");
            return Err(DbError::Timeout(limit));
        }
        tracing::info!("database connection pool closed");
        Ok(())
    }

    /// Runs `f` on a pooled connection.
    ///
    /// The connection is checked out on a blocking thread and returned to the
    /// pool when `f` finishes, whether it succeeds, fails or panics. If the
    /// returned future is dropped, or the statement timeout elapses, the
    /// statement running on that connection is interrupted so the connection
    /// comes back promptly.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Closed` after shutdown, `DbError::Pool` when no
    /// connection frees up within the acquire timeout, `DbError::Timeout`
    /// when the statement timeout elapses, and whatever `f` returns.
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, DbError> + Send + 'static,
    {
        if self.is_closed() {
            return Err(DbError::Closed);
        }
        let pool = self.pool().ok_or(DbError::Closed)?;

        let acquire_timeout = self.inner.acquire_timeout;
        let guard = InterruptGuard::default();
        let slot = Arc::clone(&guard.0);

        let task = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get_timeout(acquire_timeout)?;
            let _armed = Armed::new(&slot, conn.get_interrupt_handle())?;
            f(&mut *conn)
        });

        match self.inner.statement_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined?,
                Err(_) => {
                    tracing::warn!(timeout = ?limit, "statement timed out, interrupting");
                    drop(guard);
                    Err(DbError::Timeout(limit))
                }
            },
            None => task.await?,
        }
    }
}

/// Interrupt handle of the connection currently serving a checkout.
#[derive(Default)]
struct Interrupt {
    handle: Mutex<Option<InterruptHandle>>,
    cancelled: AtomicBool,
}

impl Interrupt {
    /// Publishes the handle; returns `false` if the caller already gave up.
    fn arm(&self, handle: InterruptHandle) -> bool {
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        !self.cancelled.load(Ordering::SeqCst)
    }

    fn disarm(&self) {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Interrupt under the lock so the connection cannot be disarmed and
        // handed to another checkout in between.
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = handle.take() {
            handle.interrupt();
        }
    }
}

/// Keeps the interrupt handle published while the connection is in use.
/// Declared after the pooled connection so it disarms before the connection
/// goes back, even when the closure panics.
struct Armed<'a>(&'a Interrupt);

impl<'a> Armed<'a> {
    fn new(slot: &'a Interrupt, handle: InterruptHandle) -> Result<Self, DbError> {
        let armed = Self(slot);
        if slot.arm(handle) {
            Ok(armed)
        } else {
            Err(DbError::Cancelled)
        }
    }
}

impl Drop for Armed<'_> {
    fn drop(&mut self) {
        self.0.disarm();
    }
}

/// Cancels the checkout when the awaiting future goes away.
///
/// After normal completion the handle is already disarmed and dropping the
/// guard does nothing.
#[derive(Default)]
struct InterruptGuard(Arc<Interrupt>);

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
