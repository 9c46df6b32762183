//! Record types of the blog.

use chrono::Utc;
use scribe_orm::{record, Field};
use uuid::Uuid;

/// Generates a primary key that sorts by creation time: the millisecond
/// timestamp zero-padded to 15 digits, a random v4 uuid in hex and `000`.
pub fn next_id() -> String {
    format!(
        "{:015}{}000",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Current time as fractional seconds since the Unix epoch.
pub fn now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

fn id_field() -> Field {
    Field::string()
        .primary_key()
        .ddl("varchar(50)")
        .default_with(next_id)
}

record! {
    /// A registered account.
    pub struct User as "users" {
        id: String = id_field(),
        email: String = Field::string().ddl("varchar(50)"),
        passwd: String = Field::string().ddl("varchar(50)"),
        admin: bool = Field::boolean(),
        name: String = Field::string().ddl("varchar(50)"),
        image: String = Field::string().ddl("varchar(500)"),
        created_at: f64 = Field::float().default_with(now),
    }
}

record! {
    /// A published article.
    pub struct Blog as "blogs" {
        id: String = id_field(),
        user_id: String = Field::string().ddl("varchar(50)"),
        user_name: String = Field::string().ddl("varchar(50)"),
        user_image: String = Field::string().ddl("varchar(500)"),
        name: String = Field::string().ddl("varchar(50)"),
        summary: String = Field::string().ddl("varchar(200)"),
        content: String = Field::text(),
        created_at: f64 = Field::float().default_with(now),
    }
}

record! {
    /// A reader's reply to a blog.
    pub struct Comment as "comments" {
        id: String = id_field(),
        blog_id: String = Field::string().ddl("varchar(50)"),
        user_id: String = Field::string().ddl("varchar(50)"),
        user_name: String = Field::string().ddl("varchar(50)"),
        user_image: String = Field::string().ddl("varchar(500)"),
        content: String = Field::text(),
        created_at: f64 = Field::float().default_with(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_orm::Record;

    #[test]
    fn ids_are_fixed_width_and_unique() {
        let a = next_id();
        let b = next_id();
        assert_eq!(a.len(), 50);
        assert!(a.ends_with("000"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn models_compile_to_their_tables() {
        assert_eq!(User::schema().table(), "users");
        assert_eq!(User::schema().primary_key(), "id");
        assert_eq!(
            User::schema().select_stmt(),
            "SELECT `id`, `email`, `passwd`, `admin`, `name`, `image`, `created_at` FROM `users`"
        );
        assert_eq!(Blog::schema().fields().len(), 7);
        assert_eq!(
            Comment::schema().delete_stmt(),
            "DELETE FROM `comments` WHERE `id`=?"
        );
    }
}
