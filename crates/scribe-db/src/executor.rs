//! Parameterised statement execution on pooled connections.
//!
//! Reads go through [`Database::select`], writes through
//! [`Database::execute`]. Both translate `?` placeholders, check the
//! argument count before touching the store, and hold a connection only for
//! the duration of the one statement.

use rusqlite::{params_from_iter, Connection};

use crate::error::DbError;
use crate::placeholder;
use crate::pool::Database;
use crate::value::{Row, Value};

fn prepare(sql: &str, args: &[Value]) -> Result<String, DbError> {
    let translated = placeholder::translate(sql)?;
    if translated.placeholders != args.len() {
        return Err(DbError::ParameterCount {
            expected: translated.placeholders,
            actual: args.len(),
        });
    }
    Ok(translated.sql)
}

fn query_rows(
    conn: &Connection,
    sql: &str,
    args: &[Value],
    limit: Option<usize>,
) -> Result<Vec<Row>, DbError> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(args.iter()))?;

    let mut out = Vec::new();
    loop {
        if limit.is_some_and(|max| out.len() >= max) {
            break;
        }
        let Some(row) = rows.next()? else {
            break;
        };
        let mut record = Row::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            record.push(column.clone(), Value::try_from(row.get_ref(idx)?)?);
        }
        out.push(record);
    }
    Ok(out)
}

fn execute_statement(
    conn: &mut Connection,
    sql: &str,
    args: &[Value],
    autocommit: bool,
) -> Result<u64, DbError> {
    if autocommit {
        let affected = conn.execute(sql, params_from_iter(args.iter()))?;
        return Ok(affected as u64);
    }

    let tx = conn.transaction()?;
    match tx.execute(sql, params_from_iter(args.iter())) {
        Ok(affected) => {
            tx.commit()?;
            Ok(affected as u64)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(err.into())
        }
    }
}

impl Database {
    /// Runs a read query and returns its rows in store order.
    ///
    /// `limit` caps how many rows are fetched; `None` fetches all of them.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ParameterCount` before any I/O when the placeholders
    /// and `args` disagree, and any pool or store error otherwise.
    pub async fn select(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, DbError> {
        tracing::info!(sql, args = args.len(), "SQL");
        let native = prepare(sql, args)?;
        let args = args.to_vec();

        let rows = self
            .with_connection(move |conn| query_rows(conn, &native, &args, limit))
            .await?;

        tracing::info!(rows = rows.len(), "rows returned");
        Ok(rows)
    }

    /// Runs a write statement and returns the number of affected rows.
    ///
    /// With `autocommit == false` the statement runs inside its own
    /// transaction: committed on success, rolled back on failure. The
    /// original failure is what the caller sees.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ParameterCount` before any I/O when the placeholders
    /// and `args` disagree, and any pool or store error otherwise.
    pub async fn execute(
        &self,
        sql: &str,
        args: &[Value],
        autocommit: bool,
    ) -> Result<u64, DbError> {
        tracing::info!(sql, args = args.len(), autocommit, "SQL");
        let native = prepare(sql, args)?;
        let args = args.to_vec();

        self.with_connection(move |conn| execute_statement(conn, &native, &args, autocommit))
            .await
    }
}
