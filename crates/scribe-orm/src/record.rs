//! The record trait and its CRUD surface.
//!
//! Record types are normally declared with [`record!`](crate::record), which
//! generates a struct with one `Option<T>` per field and implements the
//! three required methods. Everything else here is provided: hydration from
//! rows, default application, and the async queries built on the compiled
//! [`TableSchema`].

use scribe_db::{Database, Row, Value};
use std::future::Future;

use crate::error::OrmError;
use crate::query::FindAll;
use crate::schema::{quote_ident, TableSchema};

/// A typed row of one table.
///
/// `get` and `set` are the by-name view of the struct's fields; both read
/// and write the same storage as direct field access.
pub trait Record: Default + Send + Sync + 'static {
    /// Compiled schema of this record type. Compiled once, on first use.
    fn schema() -> &'static TableSchema;

    /// Current value of `field`, `None` when the record holds no value.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::UnknownField` if the type has no such field.
    fn get(&self, field: &str) -> Result<Option<Value>, OrmError>;

    /// Replaces the value of `field`. `Value::Null` clears it.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::UnknownField` if the type has no such field and
    /// `OrmError::Value` if the value does not fit the field's type.
    fn set(&mut self, field: &str, value: Value) -> Result<(), OrmError>;

    /// Builds a record from a result row, matching columns to fields.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::Value` when a column value does not fit its field.
    fn from_row(row: Row) -> Result<Self, OrmError> {
        let schema = Self::schema();
        let mut record = Self::default();
        for (column, value) in row {
            match schema.field_for_column(&column) {
                Some(field) => record.set(field, value)?,
                None => tracing::debug!(
                    table = schema.table(),
                    column = %column,
                    "ignoring unmapped column"
                ),
            }
        }
        Ok(record)
    }

    /// Value of `field`, or its declared default when the record has none.
    /// A producer default is invoked on every call. Yields `Value::Null`
    /// when there is neither.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::UnknownField` if the type has no such field.
    fn get_value_or_default(&self, field: &str) -> Result<Value, OrmError> {
        if let Some(value) = self.get(field)? {
            return Ok(value);
        }
        let schema = Self::schema();
        let mapping = schema.mapping(field).ok_or_else(|| OrmError::UnknownField {
            table: schema.table().to_string(),
            field: field.to_string(),
        })?;
        match mapping.default_value_now() {
            Some(value) => {
                tracing::debug!(field, value = %value, "using default value");
                Ok(value)
            }
            None => Ok(Value::Null),
        }
    }

    /// Primary key value held by this record.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::MissingValue` when the key is unset.
    fn primary_key_value(&self) -> Result<Value, OrmError> {
        let schema = Self::schema();
        self.get(schema.primary_key())?
            .filter(|v| !v.is_null())
            .ok_or_else(|| OrmError::MissingValue {
                table: schema.table().to_string(),
                field: schema.primary_key().to_string(),
            })
    }

    /// Looks a record up by primary key. `Ok(None)` when no row matches.
    fn find(
        db: &Database,
        key: impl Into<Value>,
    ) -> impl Future<Output = Result<Option<Self>, OrmError>> + Send {
        let key = key.into();
        async move {
            let schema = Self::schema();
            let sql = format!(
                "{} WHERE {}=?",
                schema.select_stmt(),
                quote_ident(schema.column(schema.primary_key()))
            );
            let rows = db.select(&sql, &[key], Some(1)).await?;
            rows.into_iter().next().map(Self::from_row).transpose()
        }
    }

    /// Loads every record matching `query`, in store order.
    fn find_all(
        db: &Database,
        query: FindAll,
    ) -> impl Future<Output = Result<Vec<Self>, OrmError>> + Send {
        async move {
            let (sql, args) = query.render(Self::schema().select_stmt())?;
            let rows = db.select(&sql, &args, None).await?;
            rows.into_iter().map(Self::from_row).collect()
        }
    }

    /// Runs `SELECT <select_expr> _num_ FROM <table> [WHERE ...]` and
    /// returns the scalar, or `None` when no row comes back.
    fn find_number(
        db: &Database,
        select_expr: &str,
        where_clause: Option<&str>,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<Option<Value>, OrmError>> + Send {
        let mut sql = format!(
            "SELECT {select_expr} _num_ FROM {}",
            quote_ident(Self::schema().table())
        );
        if let Some(predicate) = where_clause.filter(|w| !w.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        async move {
            let rows = db.select(&sql, &args, Some(1)).await?;
            Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().find(|(c, _)| c == "_num_"))
                .map(|(_, value)| value))
        }
    }

    /// Inserts this record and returns the primary key it was stored under.
    ///
    /// Omitted fields take their declared defaults. The record itself is
    /// left untouched, so saving it again resolves its defaults again: a
    /// producer default such as a generated key runs once per call. An
    /// affected-row count other than one is logged, not returned as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::MissingValue` before any I/O when the primary key is
    /// unset and has no default; store failures propagate unchanged.
    fn save(&self, db: &Database) -> impl Future<Output = Result<Value, OrmError>> + Send {
        async move {
            let schema = Self::schema();
            let mut args = Vec::with_capacity(schema.fields().len() + 1);
            for field in schema.fields() {
                args.push(self.get_value_or_default(field)?);
            }
            let key = self.get_value_or_default(schema.primary_key())?;
            if key.is_null() {
                return Err(OrmError::MissingValue {
                    table: schema.table().to_string(),
                    field: schema.primary_key().to_string(),
                });
            }
            args.push(key.clone());

            let rows = db
                .execute(schema.insert_stmt(), &args, db.autocommit())
                .await?;
            if rows != 1 {
                tracing::warn!(table = schema.table(), rows, "failed to insert record: affected rows");
            }
            Ok(key)
        }
    }

    /// Writes every ordinary field of this record to the row with its key.
    /// Unset fields are written as `NULL`.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::MissingValue` when the primary key is unset.
    fn update(&self, db: &Database) -> impl Future<Output = Result<(), OrmError>> + Send {
        async move {
            let schema = Self::schema();
            let key = self.primary_key_value()?;
            let mut values = Vec::with_capacity(schema.fields().len());
            for field in schema.fields() {
                values.push(self.get(field)?.unwrap_or_default());
            }
            let args = schema.update_args(values, key);

            let rows = db
                .execute(schema.update_stmt(), &args, db.autocommit())
                .await?;
            if rows != 1 {
                tracing::warn!(table = schema.table(), rows, "failed to update by primary key: affected rows");
            }
            Ok(())
        }
    }

    /// Deletes the row with this record's key.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::MissingValue` when the primary key is unset.
    fn remove(&self, db: &Database) -> impl Future<Output = Result<(), OrmError>> + Send {
        async move {
            let schema = Self::schema();
            let key = self.primary_key_value()?;

            let rows = db
                .execute(schema.delete_stmt(), &[key], db.autocommit())
                .await?;
            if rows != 1 {
                tracing::warn!(table = schema.table(), rows, "failed to remove by primary key: affected rows");
            }
            Ok(())
        }
    }
}

/// Compiles the schema of `R` now rather than on first query and logs its
/// mappings. Call once per record type at startup so a bad declaration
/// aborts there.
pub fn register<R: Record>() -> &'static TableSchema {
    let schema = R::schema();
    tracing::info!(
        table = schema.table(),
        primary_key = schema.primary_key(),
        fields = schema.fields().len(),
        "found model"
    );
    for (name, field) in schema.mappings() {
        tracing::info!(table = schema.table(), field = name, mapping = %field, "found mapping");
    }
    schema
}
