//! Scribe blog binary: opens the connection pool, compiles the record
//! types and prepares their tables, then holds the pool until shutdown.
//!
//! On SIGTERM/SIGINT the pool is drained and closed. A connection still
//! checked out when the drain deadline passes is reported and the process
//! exits non-zero.

use scribe_blog::config::{self, resolve_config_path, Config};
use scribe_blog::{bootstrap_tables, register_models};
use scribe_db::{Database, DbError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn serve(db: &Database) -> Result<(), DbError> {
    let schemas = register_models();
    bootstrap_tables(db).await?;
    tracing::info!(models = schemas.len(), "scribe blog ready");

    let signal = shutdown_signal().await;
    tracing::info!(signal, "shutting down, draining connection pool");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let (path, source) = resolve_config_path(std::env::args().nth(1), |key| std::env::var(key).ok());

    let config = match config::load_config(Some(path.as_str())) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration from {path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);
    tracing::info!(source = source.as_str(), path = %path, "resolved startup configuration path");

    let db = match Database::connect(config.database).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "failed to create database pool, check the [database] section");
            return ExitCode::FAILURE;
        }
    };

    let served = serve(&db).await;
    let closed = db.close().await;

    match (served, closed) {
        (Ok(()), Ok(())) => {
            tracing::info!("scribe blog shut down");
            ExitCode::SUCCESS
        }
        (Err(err), _) => {
            tracing::error!(error = %err, "failed to create blog tables");
            ExitCode::FAILURE
        }
        (Ok(()), Err(err)) => {
            tracing::error!(error = %err, "connection pool did not drain before shutdown");
            ExitCode::FAILURE
        }
    }
}

/// Waits for SIGINT or SIGTERM and names the one that arrived.
#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        },
        Err(err) => {
            tracing::warn!(error = %err, "SIGTERM handler unavailable, waiting for SIGINT only");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

/// Waits for SIGINT.
#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
