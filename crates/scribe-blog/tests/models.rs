//! Blog record types against a bootstrapped store.

use scribe_blog::models::{Blog, Comment, User};
use scribe_blog::{bootstrap_tables, register_models};
use scribe_db::{Database, DbConfig, Value};
use scribe_orm::{FindAll, Record};
use tempfile::TempDir;

async fn open(dir: &TempDir) -> Database {
    let path = dir.path().join("blog.db");
    let db = Database::connect(DbConfig::new("www-data", "www-data", path.to_string_lossy()))
        .await
        .expect("connect should succeed");
    register_models();
    bootstrap_tables(&db).await.expect("bootstrap should succeed");
    db
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;
    bootstrap_tables(&db)
        .await
        .expect("second bootstrap should succeed");
}

#[tokio::test]
async fn registered_user_is_found_by_email() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let user = User {
        name: Some("Test".to_string()),
        email: Some("test@example.com".to_string()),
        passwd: Some("0123456789abcdef".to_string()),
        image: Some("about:blank".to_string()),
        ..Default::default()
    };
    let id = user.save(&db).await.expect("save should succeed");
    let id = id.as_str().expect("generated id is text").to_string();
    assert_eq!(id.len(), 50);

    let users = User::find_all(
        &db,
        FindAll::new().filter("email=?", vec![Value::from("test@example.com")]),
    )
    .await
    .expect("find_all should succeed");
    assert_eq!(users.len(), 1);
    let stored = &users[0];
    assert_eq!(stored.id.as_deref(), Some(id.as_str()));
    assert_eq!(stored.name, user.name);
    assert_eq!(stored.admin, Some(false));
    assert!(stored.created_at.expect("timestamp default stored") > 0.0);

    let nobody = User::find_all(
        &db,
        FindAll::new().filter("email=?", vec![Value::from("nobody@example.com")]),
    )
    .await
    .expect("find_all should succeed");
    assert!(nobody.is_empty());
}

#[tokio::test]
async fn blog_comments_are_counted_and_paged() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let db = open(&dir).await;

    let mut blog = Blog {
        user_id: Some("u1".to_string()),
        user_name: Some("Test".to_string()),
        user_image: Some("about:blank".to_string()),
        name: Some("Learn Rust".to_string()),
        summary: Some("Ownership in five minutes".to_string()),
        content: Some("...".to_string()),
        ..Default::default()
    };
    let key = blog.save(&db).await.expect("blog save should succeed");
    let blog_id = key.as_str().expect("generated id is text").to_string();
    blog.id = Some(blog_id.clone());

    for n in 0..4 {
        let comment = Comment {
            blog_id: Some(blog_id.clone()),
            user_id: Some("u1".to_string()),
            user_name: Some("Test".to_string()),
            user_image: Some("about:blank".to_string()),
            content: Some(format!("comment {n}")),
            created_at: Some(f64::from(n)),
            ..Default::default()
        };
        comment.save(&db).await.expect("comment save should succeed");
    }

    let count = Comment::find_number(&db, "count(id)", Some("blog_id=?"), vec![Value::from(blog_id.as_str())])
        .await
        .expect("count should succeed");
    assert_eq!(count, Some(Value::Integer(4)));

    let page = Comment::find_all(
        &db,
        FindAll::new()
            .filter("blog_id=?", vec![Value::from(blog_id.as_str())])
            .order_by("created_at desc")
            .limit((1_u64, 2_u64)),
    )
    .await
    .expect("paged find_all should succeed");
    let contents: Vec<_> = page.iter().filter_map(|c| c.content.as_deref()).collect();
    assert_eq!(contents, ["comment 2", "comment 1"]);

    blog.summary = Some("Borrowing in five minutes".to_string());
    blog.update(&db).await.expect("update should succeed");
    let loaded = Blog::find(&db, blog_id.as_str())
        .await
        .expect("find should succeed")
        .expect("blog should exist");
    assert_eq!(loaded.summary.as_deref(), Some("Borrowing in five minutes"));

    blog.remove(&db).await.expect("remove should succeed");
    assert!(Blog::find(&db, blog_id).await.expect("find should succeed").is_none());
    db.close().await.expect("pool should close cleanly");
}
