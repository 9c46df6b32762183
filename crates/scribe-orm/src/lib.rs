//! A small typed ORM over `scribe-db`.
//!
//! Record types declare their columns once with [`record!`]. The declaration
//! is compiled into a [`TableSchema`] holding the SQL templates for every
//! CRUD statement, and the [`Record`] trait runs those templates through a
//! [`Database`] handle.
//!
//! ```ignore
//! use scribe_orm::{record, Field, FindAll, Record};
//!
//! record! {
//!     pub struct Post as "posts" {
//!         id: String = Field::string().primary_key(),
//!         title: String = Field::string(),
//!         views: i64 = Field::integer(),
//!     }
//! }
//!
//! let post = Post { id: Some("p1".into()), title: Some("Hello".into()), ..Default::default() };
//! let key = post.save(&db).await?;
//! let found = Post::find(&db, "p1").await?;
//! let top = Post::find_all(&db, FindAll::new().order_by("`views` DESC").limit(10_u64)).await?;
//! ```

mod error;
mod field;
mod macros;
mod query;
mod record;
mod schema;

pub use error::{OrmError, SchemaError};
pub use field::{Field, FieldDefault, StorageType};
pub use query::{FindAll, Limit};
pub use record::{register, Record};
pub use schema::{quote_ident, SchemaBuilder, TableSchema};

pub use scribe_db::{Database, DbConfig, DbError, FromValue, Row, Value};
