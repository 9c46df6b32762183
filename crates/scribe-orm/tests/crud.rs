//! CRUD behaviour of record types against a file-backed store.

use scribe_orm::{record, Database, DbConfig, DbError, Field, FindAll, OrmError, Record, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use tempfile::TempDir;

record! {
    pub struct Post as "posts" {
        id: String = Field::string().primary_key().ddl("varchar(50)"),
        title: String = Field::string(),
        views: i64 = Field::integer(),
    }
}

static NEXT_TICKET: AtomicI64 = AtomicI64::new(1);

record! {
    /// Key generated by a producer default.
    pub struct Ticket {
        id: i64 = Field::integer()
            .primary_key()
            .default_with(|| NEXT_TICKET.fetch_add(1, Ordering::SeqCst)),
        subject: String = Field::text(),
        open: bool = Field::boolean(),
        weight: f64 = Field::float(),
    }
}

record! {
    pub struct Account as "accounts" {
        id: String = Field::string().primary_key(),
        passwd: String = Field::string().named("password"),
    }
}

record! {
    pub struct Broken {
        body: String = Field::text(),
    }
}

async fn open(dir: &TempDir) -> Database {
    let path = dir.path().join("crud.db");
    let db = Database::connect(DbConfig::new("scribe", "secret", path.to_string_lossy()))
        .await
        .expect("connect should succeed");
    for create in [
        Post::schema().create_stmt(),
        Ticket::schema().create_stmt(),
        Account::schema().create_stmt(),
    ] {
        db.execute(create, &[], true)
            .await
            .expect("create table should succeed");
    }
    db
}

fn post(id: &str, title: &str, views: Option<i64>) -> Post {
    Post {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        views,
    }
}

#[tokio::test]
async fn save_applies_defaults_and_find_returns_them() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let p = post("p1", "Hello", None);
    let key = p.save(&db).await.expect("save should succeed");
    assert_eq!(key, Value::from("p1"));
    assert_eq!(p.views, None, "save leaves the record untouched");

    let found = Post::find(&db, "p1")
        .await
        .expect("find should succeed")
        .expect("saved post should exist");
    assert_eq!(found, post("p1", "Hello", Some(0)));
}

#[tokio::test]
async fn find_missing_key_is_none() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let found = Post::find(&db, "nope").await.expect("find should succeed");
    assert!(found.is_none());
}

#[tokio::test]
async fn producer_default_runs_per_save() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let a = Ticket {
        subject: Some("first".to_string()),
        ..Default::default()
    };
    let b = Ticket {
        subject: Some("second".to_string()),
        ..Default::default()
    };
    let ka = a.save(&db).await.expect("first save should succeed");
    let kb = b.save(&db).await.expect("second save should succeed");
    assert_ne!(ka, kb);
    assert_eq!(a.id, None);

    let loaded = Ticket::find(&db, kb)
        .await
        .expect("find should succeed")
        .expect("ticket should exist");
    assert_eq!(loaded.subject.as_deref(), Some("second"));
    assert_eq!(loaded.open, Some(false));
    assert_eq!(loaded.weight, Some(0.0));
}

#[tokio::test]
async fn saving_the_same_record_twice_generates_a_fresh_key() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let ticket = Ticket {
        subject: Some("again".to_string()),
        ..Default::default()
    };
    let first = ticket.save(&db).await.expect("first save should succeed");
    let second = ticket
        .save(&db)
        .await
        .expect("second save should get its own key");
    assert_ne!(first, second);

    let count = Ticket::find_number(&db, "count(*)", Some("`subject`=?"), vec![Value::from("again")])
        .await
        .expect("count should succeed");
    assert_eq!(count, Some(Value::Integer(2)));
}

#[tokio::test]
async fn find_all_filters_orders_and_limits() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    for views in 1..=5_i64 {
        post(&format!("p{views}"), "t", Some(views))
            .save(&db)
            .await
            .expect("save should succeed");
    }

    let all = Post::find_all(&db, FindAll::new())
        .await
        .expect("find_all should succeed");
    assert_eq!(all.len(), 5);

    let busy = Post::find_all(
        &db,
        FindAll::new()
            .filter("`views` > ?", vec![Value::from(3_i64)])
            .order_by("`views` DESC"),
    )
    .await
    .expect("filtered find_all should succeed");
    let views: Vec<_> = busy.iter().filter_map(|p| p.views).collect();
    assert_eq!(views, [5, 4]);

    let first = Post::find_all(&db, FindAll::new().order_by("`views`").limit(3_u64))
        .await
        .expect("limited find_all should succeed");
    let views: Vec<_> = first.iter().filter_map(|p| p.views).collect();
    assert_eq!(views, [1, 2, 3]);

    let page = Post::find_all(&db, FindAll::new().order_by("`views`").limit((2_u64, 3_u64)))
        .await
        .expect("paged find_all should succeed");
    let views: Vec<_> = page.iter().filter_map(|p| p.views).collect();
    assert_eq!(views, [3, 4, 5]);
}

#[tokio::test]
async fn find_number_returns_scalar() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let empty = Post::find_number(&db, "count(`id`)", None, Vec::new())
        .await
        .expect("count should succeed");
    assert_eq!(empty, Some(Value::Integer(0)));

    for (id, views) in [("a", 10_i64), ("b", 20), ("c", 30)] {
        post(id, "t", Some(views))
            .save(&db)
            .await
            .expect("save should succeed");
    }

    let count = Post::find_number(&db, "count(`id`)", Some("`views` >= ?"), vec![Value::from(20_i64)])
        .await
        .expect("count should succeed");
    assert_eq!(count, Some(Value::Integer(2)));

    let total = Post::find_number(&db, "sum(`views`)", None, Vec::new())
        .await
        .expect("sum should succeed");
    assert_eq!(total, Some(Value::Integer(60)));
}

#[tokio::test]
async fn update_and_remove_by_key() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let mut p = post("p1", "Draft", Some(1));
    p.save(&db).await.expect("save should succeed");

    p.title = Some("Final".to_string());
    p.views = None;
    p.update(&db).await.expect("update should succeed");

    let found = Post::find(&db, "p1")
        .await
        .expect("find should succeed")
        .expect("post should still exist");
    assert_eq!(found.title.as_deref(), Some("Final"));
    assert_eq!(found.views, None, "unset fields are written as NULL");

    p.remove(&db).await.expect("remove should succeed");
    assert!(Post::find(&db, "p1").await.expect("find should succeed").is_none());

    // Nothing left to match: logged, not an error.
    p.update(&db).await.expect("update of missing row is not an error");
    p.remove(&db).await.expect("remove of missing row is not an error");
}

#[tokio::test]
async fn save_without_key_fails_before_io() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let p = Post {
        title: Some("orphan".to_string()),
        ..Default::default()
    };
    let err = p.save(&db).await.expect_err("save without key must fail");
    assert!(matches!(err, OrmError::MissingValue { ref field, .. } if field == "id"));

    let count = Post::find_number(&db, "count(*)", None, Vec::new())
        .await
        .expect("count should succeed");
    assert_eq!(count, Some(Value::Integer(0)));

    let err = p.remove(&db).await.expect_err("remove without key must fail");
    assert!(matches!(err, OrmError::MissingValue { .. }));
}

#[tokio::test]
async fn duplicate_key_surfaces_store_error() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    post("p1", "one", None)
        .save(&db)
        .await
        .expect("first save should succeed");
    let clash = post("p1", "two", None);
    let err = clash
        .save(&db)
        .await
        .expect_err("second save must violate the key");
    assert!(matches!(err, OrmError::Db(DbError::Sqlite(_))));
    assert_eq!(clash, post("p1", "two", None), "failed save leaves no defaults behind");
}

#[tokio::test]
async fn logical_names_are_used_as_columns() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let account = Account {
        id: Some("u1".to_string()),
        passwd: Some("hash".to_string()),
    };
    account.save(&db).await.expect("save should succeed");

    let rows = db
        .select("SELECT `password` FROM `accounts`", &[], None)
        .await
        .expect("raw select should succeed");
    assert_eq!(rows[0].get("password"), Some(&Value::from("hash")));

    let found = Account::find(&db, "u1")
        .await
        .expect("find should succeed")
        .expect("account should exist");
    assert_eq!(found.passwd.as_deref(), Some("hash"));
}

#[test]
fn get_and_set_mirror_fields() {
    let mut p = Post::default();
    assert_eq!(p.get("title").unwrap(), None);

    p.set("title", Value::from("Hi")).unwrap();
    assert_eq!(p.title.as_deref(), Some("Hi"));
    assert_eq!(p.get("title").unwrap(), Some(Value::from("Hi")));

    p.views = Some(7);
    assert_eq!(p.get_value_or_default("views").unwrap(), Value::Integer(7));

    p.set("views", Value::Null).unwrap();
    assert_eq!(p.views, None);
    assert_eq!(p.get_value_or_default("views").unwrap(), Value::Integer(0));
    assert_eq!(p.get_value_or_default("title").unwrap(), Value::from("Hi"));
    assert_eq!(p.get_value_or_default("id").unwrap(), Value::Null);
}

#[test]
fn unknown_and_mistyped_fields_are_rejected() {
    let mut p = Post::default();

    let err = p.set("author", Value::from("x")).unwrap_err();
    assert!(matches!(err, OrmError::UnknownField { ref table, ref field } if table == "posts" && field == "author"));
    assert!(matches!(p.get("author"), Err(OrmError::UnknownField { .. })));

    let err = p.set("views", Value::from("many")).unwrap_err();
    assert!(matches!(err, OrmError::Value(_)));
    assert_eq!(p.views, None);
}

#[test]
fn schema_is_compiled_once_per_type() {
    let a: *const _ = Post::schema();
    let b: *const _ = scribe_orm::register::<Post>();
    assert_eq!(a, b);
    assert_eq!(Post::schema().table(), "posts");
    assert_eq!(Ticket::schema().table(), "Ticket");
    assert_eq!(Ticket::schema().fields(), ["subject", "open", "weight"]);
}

#[test]
#[should_panic(expected = "invalid record type `Broken`")]
fn declaration_without_primary_key_panics() {
    let _ = Broken::schema();
}
