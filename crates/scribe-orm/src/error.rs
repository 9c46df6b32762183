//! Error types for schema compilation and record operations.

use scribe_db::{DbError, ValueError};

/// A record type declaration that cannot be compiled into a schema.
///
/// These are programming errors in the declaration, not runtime failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// No field is marked as primary key.
    #[error("primary key not found for table `{table}`")]
    MissingPrimaryKey {
        /// Table being compiled.
        table: String,
    },

    /// More than one field is marked as primary key.
    #[error("duplicate primary key for field `{field}` in table `{table}`")]
    DuplicatePrimaryKey {
        /// Table being compiled.
        table: String,
        /// The second primary key field encountered.
        field: String,
    },

    /// The same field name was declared twice.
    #[error("field `{field}` declared twice in table `{table}`")]
    DuplicateField {
        /// Table being compiled.
        table: String,
        /// The repeated field name.
        field: String,
    },
}

/// Errors returned by record operations.
#[derive(Debug, thiserror::Error)]
pub enum OrmError {
    /// The store rejected or failed the statement.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A value did not fit the field's Rust type.
    #[error("value conversion failed: {0}")]
    Value(#[from] ValueError),

    /// The record type has no field by that name.
    #[error("table `{table}` has no field `{field}`")]
    UnknownField {
        /// Table of the record type.
        table: String,
        /// The requested field name.
        field: String,
    },

    /// A value required for the statement is absent and has no default.
    #[error("no value for `{field}` in table `{table}`")]
    MissingValue {
        /// Table of the record type.
        table: String,
        /// The field without a value.
        field: String,
    },

    /// A limit does not fit the store's signed integer range.
    #[error("invalid limit value: {0}")]
    InvalidLimit(u64),
}
