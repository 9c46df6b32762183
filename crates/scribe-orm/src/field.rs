//! Column descriptors.
//!
//! A [`Field`] describes one column of a record type: its logical name, its
//! storage type, whether it is the primary key and what value to use when a
//! record leaves it empty. The preset constructors fix the storage type and a
//! type-appropriate default; the builder methods adjust the rest.

use scribe_db::Value;
use std::fmt;
use std::sync::Arc;

/// Storage type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// Short text, `varchar(100)` unless overridden.
    String,
    /// Boolean flag.
    Boolean,
    /// 64-bit integer.
    Integer,
    /// Double precision float.
    Float,
    /// Unbounded text.
    Text,
}

impl StorageType {
    /// Descriptor type name used in the debug rendering.
    pub fn type_tag(self) -> &'static str {
        match self {
            Self::String => "StringField",
            Self::Boolean => "BooleanField",
            Self::Integer => "IntegerField",
            Self::Float => "FloatField",
            Self::Text => "TextField",
        }
    }

    /// Column type used in `CREATE TABLE` when none is given.
    pub fn default_ddl(self) -> &'static str {
        match self {
            Self::String => "varchar(100)",
            Self::Boolean => "boolean",
            Self::Integer => "bigint",
            Self::Float => "real",
            Self::Text => "text",
        }
    }
}

/// Value used when a record omits a field on insert.
#[derive(Clone)]
pub enum FieldDefault {
    /// Reused as is on every insert.
    Literal(Value),
    /// Called afresh on every insert.
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    /// Produces the default value, invoking the producer if there is one.
    pub fn resolve(&self) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Producer(produce) => produce(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Metadata for one column.
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    storage_type: StorageType,
    primary_key: bool,
    default: Option<FieldDefault>,
    ddl: String,
}

impl Field {
    fn preset(storage_type: StorageType, default: Option<Value>) -> Self {
        Self {
            name: None,
            storage_type,
            primary_key: false,
            default: default.map(FieldDefault::Literal),
            ddl: storage_type.default_ddl().to_string(),
        }
    }

    /// A `varchar(100)` column with no default.
    pub fn string() -> Self {
        Self::preset(StorageType::String, None)
    }

    /// A boolean column defaulting to `false`.
    pub fn boolean() -> Self {
        Self::preset(StorageType::Boolean, Some(Value::Bool(false)))
    }

    /// A `bigint` column defaulting to `0`.
    pub fn integer() -> Self {
        Self::preset(StorageType::Integer, Some(Value::Integer(0)))
    }

    /// A `real` column defaulting to `0.0`.
    pub fn float() -> Self {
        Self::preset(StorageType::Float, Some(Value::Float(0.0)))
    }

    /// A `text` column with no default.
    pub fn text() -> Self {
        Self::preset(StorageType::Text, None)
    }

    /// Sets the column name used in SQL, overriding the declared field name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks this column as the table's primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Uses `value` whenever a record omits this field.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Literal(value.into()));
        self
    }

    /// Calls `producer` for a fresh value whenever a record omits this field.
    pub fn default_with<F, V>(mut self, producer: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.default = Some(FieldDefault::Producer(Arc::new(move || producer().into())));
        self
    }

    /// Drops any default, including the preset one.
    pub fn no_default(mut self) -> Self {
        self.default = None;
        self
    }

    /// Overrides the column type used in `CREATE TABLE`, e.g. `varchar(50)`.
    pub fn ddl(mut self, ddl: impl Into<String>) -> Self {
        self.ddl = ddl.into();
        self
    }

    /// Logical column name, if one was given.
    pub fn logical_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Storage type tag.
    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    /// Whether this is the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// The declared default, if any.
    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    /// Resolves the default into a value, if there is one.
    pub fn default_value_now(&self) -> Option<Value> {
        self.default.as_ref().map(FieldDefault::resolve)
    }

    /// Column type text.
    pub fn column_type(&self) -> &str {
        &self.ddl
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{},{},{}>",
            self.storage_type.type_tag(),
            self.ddl,
            self.name.as_deref().unwrap_or_default()
        )
    }
}
