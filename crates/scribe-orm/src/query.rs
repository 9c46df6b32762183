//! Options for [`Record::find_all`](crate::Record::find_all).

use scribe_db::Value;

use crate::error::OrmError;

/// Row limit for a multi-row query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most `n` rows.
    Count(u64),
    /// At most `count` rows, skipping the first `offset`.
    Range {
        /// Rows to skip.
        offset: u64,
        /// Rows to return.
        count: u64,
    },
}

impl From<u64> for Limit {
    fn from(count: u64) -> Self {
        Self::Count(count)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Self::Range { offset, count }
    }
}

fn bound(n: u64) -> Result<Value, OrmError> {
    i64::try_from(n)
        .map(Value::Integer)
        .map_err(|_| OrmError::InvalidLimit(n))
}

/// Filter, ordering and limit for a multi-row query.
///
/// The `WHERE` and `ORDER BY` text is inserted verbatim; only `args` are
/// bound as parameters. Callers own the safety of the predicate text.
#[derive(Debug, Clone, Default)]
pub struct FindAll {
    /// Raw predicate, without the `WHERE` keyword.
    pub where_clause: Option<String>,
    /// Arguments for the `?` placeholders in `where_clause`.
    pub args: Vec<Value>,
    /// Raw ordering, without the `ORDER BY` keywords.
    pub order_by: Option<String>,
    /// Row limit.
    pub limit: Option<Limit>,
}

impl FindAll {
    /// No filter, no ordering, no limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the predicate and its arguments.
    pub fn filter(mut self, where_clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.where_clause = Some(where_clause.into());
        self.args = args;
        self
    }

    /// Sets the ordering.
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Sets the limit: a count or an `(offset, count)` pair.
    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Appends the clauses to `select_stmt` and returns the statement with
    /// its arguments. Empty predicate or ordering text is ignored.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::InvalidLimit` for a limit beyond `i64::MAX`.
    pub fn render(&self, select_stmt: &str) -> Result<(String, Vec<Value>), OrmError> {
        let mut sql = vec![select_stmt.to_string()];
        let mut args = self.args.clone();

        if let Some(predicate) = self.where_clause.as_deref().filter(|w| !w.is_empty()) {
            sql.push("WHERE".to_string());
            sql.push(predicate.to_string());
        }
        if let Some(order) = self.order_by.as_deref().filter(|o| !o.is_empty()) {
            sql.push("ORDER BY".to_string());
            sql.push(order.to_string());
        }
        match self.limit {
            Some(Limit::Count(count)) => {
                sql.push("LIMIT ?".to_string());
                args.push(bound(count)?);
            }
            Some(Limit::Range { offset, count }) => {
                sql.push("LIMIT ?, ?".to_string());
                args.push(bound(offset)?);
                args.push(bound(count)?);
            }
            None => {}
        }

        Ok((sql.join(" "), args))
    }
}
