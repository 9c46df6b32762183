//! Blog host for the Scribe ORM: configuration, record types and table
//! bootstrap shared by the binary and its tests.

pub mod config;
pub mod models;

use models::{Blog, Comment, User};
use scribe_orm::{register, Database, DbError, Record, TableSchema};

/// Compiles and logs every record type's schema. A broken declaration
/// panics here, at startup.
pub fn register_models() -> [&'static TableSchema; 3] {
    [register::<User>(), register::<Blog>(), register::<Comment>()]
}

/// Creates any missing table for the blog's record types.
///
/// # Errors
///
/// Returns the store error of the first statement that fails.
pub async fn bootstrap_tables(db: &Database) -> Result<(), DbError> {
    for schema in [User::schema(), Blog::schema(), Comment::schema()] {
        db.execute(schema.create_stmt(), &[], true).await?;
        tracing::debug!(table = schema.table(), "table ready");
    }
    Ok(())
}
