//! Schema compilation: field declarations in, SQL templates out.
//!
//! A record type declares its fields once through [`SchemaBuilder`]. Building
//! partitions them into the primary key and the ordinary fields (keeping
//! declaration order, which fixes placeholder binding order) and synthesizes
//! the select, insert, update, delete and create statements. The resulting
//! [`TableSchema`] is immutable and shared by every instance.

use scribe_db::Value;

use crate::error::SchemaError;
use crate::field::Field;

/// Quotes an identifier with backticks, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `n` comma separated placeholders.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Collects field declarations for one record type.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    type_name: String,
    table: Option<String>,
    fields: Vec<(String, Field)>,
}

impl SchemaBuilder {
    /// Starts a declaration for the record type `type_name`. The table name
    /// defaults to the type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    /// Overrides the table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declares a field. Order of calls is column order.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Compiles the declaration.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::MissingPrimaryKey` or
    /// `SchemaError::DuplicatePrimaryKey` unless exactly one field is the
    /// primary key, and `SchemaError::DuplicateField` when a name repeats.
    pub fn build(self) -> Result<TableSchema, SchemaError> {
        let table = self.table.unwrap_or(self.type_name);
        tracing::debug!(table = %table, "compiling record schema");

        let mut primary_key: Option<String> = None;
        let mut fields = Vec::new();
        for (idx, (name, field)) in self.fields.iter().enumerate() {
            if self.fields[..idx].iter().any(|(seen, _)| seen == name) {
                return Err(SchemaError::DuplicateField {
                    table,
                    field: name.clone(),
                });
            }
            tracing::debug!(field = %name, mapping = %field, "found mapping");
            if field.is_primary_key() {
                if primary_key.is_some() {
                    return Err(SchemaError::DuplicatePrimaryKey {
                        table,
                        field: name.clone(),
                    });
                }
                primary_key = Some(name.clone());
            } else {
                fields.push(name.clone());
            }
        }
        let primary_key = primary_key.ok_or_else(|| SchemaError::MissingPrimaryKey {
            table: table.clone(),
        })?;

        let mut schema = TableSchema {
            table,
            primary_key,
            fields,
            mappings: self.fields,
            select_stmt: String::new(),
            insert_stmt: String::new(),
            update_stmt: String::new(),
            delete_stmt: String::new(),
            create_stmt: String::new(),
        };
        schema.synthesize();
        Ok(schema)
    }
}

/// Compiled, immutable table metadata and statement templates.
#[derive(Debug, Clone)]
pub struct TableSchema {
    table: String,
    primary_key: String,
    fields: Vec<String>,
    mappings: Vec<(String, Field)>,
    select_stmt: String,
    insert_stmt: String,
    update_stmt: String,
    delete_stmt: String,
    create_stmt: String,
}

impl TableSchema {
    fn synthesize(&mut self) {
        let table = quote_ident(&self.table);
        let pk = quote_ident(self.column(&self.primary_key));
        let columns: Vec<String> = self
            .fields
            .iter()
            .map(|f| quote_ident(self.column(f)))
            .collect();

        let mut select_columns = vec![pk.clone()];
        select_columns.extend(columns.iter().cloned());
        self.select_stmt = format!("SELECT {} FROM {table}", select_columns.join(", "));

        let mut insert_columns = columns.clone();
        insert_columns.push(pk.clone());
        self.insert_stmt = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            insert_columns.join(", "),
            placeholders(insert_columns.len())
        );

        // A key-only table has nothing to set; rewriting the key onto
        // itself keeps the statement valid.
        let assignments = if columns.is_empty() {
            format!("{pk}=?")
        } else {
            columns
                .iter()
                .map(|c| format!("{c}=?"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        self.update_stmt = format!("UPDATE {table} SET {assignments} WHERE {pk}=?");
        self.delete_stmt = format!("DELETE FROM {table} WHERE {pk}=?");

        let definitions: Vec<String> = self
            .mappings
            .iter()
            .map(|(name, field)| {
                let mut def = format!("{} {}", quote_ident(self.column(name)), field.column_type());
                if field.is_primary_key() {
                    def.push_str(" NOT NULL PRIMARY KEY");
                }
                def
            })
            .collect();
        self.create_stmt = format!(
            "CREATE TABLE IF NOT EXISTS {table} ({})",
            definitions.join(", ")
        );
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Field name of the primary key.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Ordinary (non-key) field names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Every field with its descriptor, in declaration order.
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.mappings.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Descriptor of `field`.
    pub fn mapping(&self, field: &str) -> Option<&Field> {
        self.mappings
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, field)| field)
    }

    /// SQL column name of `field`: its logical name if set, else the field
    /// name itself.
    pub fn column<'a>(&'a self, field: &'a str) -> &'a str {
        self.mapping(field)
            .and_then(Field::logical_name)
            .unwrap_or(field)
    }

    /// Field name that maps to a result column.
    pub fn field_for_column(&self, column: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|(name, field)| field.logical_name().unwrap_or(name) == column)
            .map(|(name, _)| name.as_str())
    }

    /// `SELECT <pk>, <fields...> FROM <table>`.
    pub fn select_stmt(&self) -> &str {
        &self.select_stmt
    }

    /// `INSERT INTO <table> (<fields...>, <pk>) VALUES (?, ...)`.
    pub fn insert_stmt(&self) -> &str {
        &self.insert_stmt
    }

    /// `UPDATE <table> SET <field>=?, ... WHERE <pk>=?`.
    pub fn update_stmt(&self) -> &str {
        &self.update_stmt
    }

    /// `DELETE FROM <table> WHERE <pk>=?`.
    pub fn delete_stmt(&self) -> &str {
        &self.delete_stmt
    }

    /// `CREATE TABLE IF NOT EXISTS` for this table.
    pub fn create_stmt(&self) -> &str {
        &self.create_stmt
    }

    /// Arguments for [`update_stmt`](Self::update_stmt) given the ordinary
    /// field values (in order) and the key.
    pub fn update_args(&self, mut values: Vec<Value>, key: Value) -> Vec<Value> {
        if self.fields.is_empty() {
            values.push(key.clone());
        }
        values.push(key);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> SchemaBuilder {
        SchemaBuilder::new("Post")
            .field("id", Field::string().primary_key().ddl("varchar(50)"))
            .field("title", Field::string())
            .field("views", Field::integer())
    }

    #[test]
    fn synthesizes_statements_in_declaration_order() {
        let schema = post().build().expect("schema should compile");

        assert_eq!(schema.table(), "Post");
        assert_eq!(schema.primary_key(), "id");
        assert_eq!(schema.fields(), ["title", "views"]);
        assert_eq!(
            schema.select_stmt(),
            "SELECT `id`, `title`, `views` FROM `Post`"
        );
        assert_eq!(
            schema.insert_stmt(),
            "INSERT INTO `Post` (`title`, `views`, `id`) VALUES (?, ?, ?)"
        );
        assert_eq!(
            schema.update_stmt(),
            "UPDATE `Post` SET `title`=?, `views`=? WHERE `id`=?"
        );
        assert_eq!(schema.delete_stmt(), "DELETE FROM `Post` WHERE `id`=?");
        assert_eq!(
            schema.create_stmt(),
            "CREATE TABLE IF NOT EXISTS `Post` (`id` varchar(50) NOT NULL PRIMARY KEY, \
             `title` varchar(100), `views` bigint)"
        );
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = post().build().expect("schema should compile");
        let b = post().build().expect("schema should compile");

        assert_eq!(a.select_stmt(), b.select_stmt());
        assert_eq!(a.insert_stmt(), b.insert_stmt());
        assert_eq!(a.update_stmt(), b.update_stmt());
        assert_eq!(a.delete_stmt(), b.delete_stmt());
        assert_eq!(a.fields(), b.fields());
    }

    #[test]
    fn primary_key_must_be_unique() {
        let none = SchemaBuilder::new("Note")
            .field("body", Field::text())
            .build()
            .expect_err("no primary key must fail");
        assert_eq!(
            none,
            SchemaError::MissingPrimaryKey {
                table: "Note".to_string()
            }
        );

        let two = SchemaBuilder::new("Note")
            .field("a", Field::string().primary_key())
            .field("b", Field::integer().primary_key())
            .build()
            .expect_err("two primary keys must fail");
        assert_eq!(
            two,
            SchemaError::DuplicatePrimaryKey {
                table: "Note".to_string(),
                field: "b".to_string()
            }
        );

        SchemaBuilder::new("Note")
            .field("a", Field::string().primary_key())
            .build()
            .expect("exactly one primary key must succeed");
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let err = SchemaBuilder::new("Note")
            .field("id", Field::string().primary_key())
            .field("body", Field::text())
            .field("body", Field::text())
            .build()
            .expect_err("repeated field must fail");
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn table_override_and_logical_names() {
        let schema = SchemaBuilder::new("User")
            .table("users")
            .field("id", Field::string().primary_key())
            .field("passwd", Field::string().named("password"))
            .build()
            .expect("schema should compile");

        assert_eq!(schema.select_stmt(), "SELECT `id`, `password` FROM `users`");
        assert_eq!(
            schema.update_stmt(),
            "UPDATE `users` SET `password`=? WHERE `id`=?"
        );
        assert_eq!(schema.field_for_column("password"), Some("passwd"));
        assert_eq!(schema.field_for_column("passwd"), None);
    }

    #[test]
    fn identifiers_are_escaped() {
        assert_eq!(quote_ident("odd`name"), "`odd``name`");
    }

    #[test]
    fn key_only_table_update_binds_key_twice() {
        let schema = SchemaBuilder::new("Tag")
            .field("name", Field::string().primary_key())
            .build()
            .expect("schema should compile");

        assert_eq!(
            schema.insert_stmt(),
            "INSERT INTO `Tag` (`name`) VALUES (?)"
        );
        assert_eq!(
            schema.update_stmt(),
            "UPDATE `Tag` SET `name`=? WHERE `name`=?"
        );
        assert_eq!(
            schema.update_args(Vec::new(), Value::from("rust")),
            vec![Value::from("rust"), Value::from("rust")]
        );
    }
}
