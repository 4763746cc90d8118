//! Helpers for tests that need a live PostgreSQL server.
//!
//! Set `TEST_DATABASE_URL` to run them; without it they return early. Each
//! test gets its own PostgreSQL schema, selected through `search_path`, so
//! tests can run in parallel against one database.

#![allow(dead_code)]

use postboard_orm::DatabaseConfig;
use sqlx::{PgPool, Row};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const USERS_SQL: &str = "CREATE TABLE users (id SERIAL PRIMARY KEY, full_name TEXT);";
pub const PROFILES_SQL: &str = "CREATE TABLE profiles (\n    id SERIAL PRIMARY KEY,\n    user_id INTEGER NOT NULL REFERENCES users (id),\n    bio TEXT\n);";
pub const POSTS_SQL: &str = "CREATE TABLE posts (\n    id SERIAL PRIMARY KEY,\n    author_id INTEGER NOT NULL REFERENCES users (id),\n    text VARCHAR(256)\n);";
pub const NOTES_SQL: &str = "CREATE TABLE notes (id SERIAL PRIMARY KEY, body TEXT, updated_at TIMESTAMPTZ);";
pub const TOUCH_TRIGGER_SQL: &str = "CREATE FUNCTION touch_updated_at() RETURNS trigger AS $$
BEGIN
  NEW.updated_at = now();
  RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER notes_touch BEFORE UPDATE ON notes
  FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

INSERT INTO notes (body) VALUES ('a;b');
";
pub const BROKEN_POSTS_SQL: &str = "CREATE TABLE posts (id SERIAL PRIMARY KEY,, author_id INTEGER);";

/// An isolated schema inside the test database
pub struct TestDatabase {
    pub admin: PgPool,
    pub schema: String,
    pub url: String,
}

impl TestDatabase {
    /// Returns `None` when `TEST_DATABASE_URL` is not set
    pub async fn create() -> Option<Self> {
        let base_url = std::env::var("TEST_DATABASE_URL").ok()?;
        let admin = PgPool::connect(&base_url).await.expect("connect to TEST_DATABASE_URL");

        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
        let schema = format!(
            "postboard_test_{}_{}_{}",
            std::process::id(),
            nanos,
            COUNTER.fetch_add(1, Ordering::SeqCst)
        );
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await
            .expect("create test schema");

        let separator = if base_url.contains('?') { '&' } else { '?' };
        let url = format!("{}{}options=-c%20search_path%3D{}", base_url, separator, schema);

        Some(Self { admin, schema, url })
    }

    pub fn config(&self, migrations_dir: &Path) -> DatabaseConfig {
        DatabaseConfig::new(&self.url)
            .unwrap()
            .with_migrations_dir(migrations_dir)
            .with_connect_timeout(Duration::from_secs(5))
    }

    pub async fn table_exists(&self, table: &str) -> bool {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_one(&self.admin)
        .await
        .unwrap();
        row.get::<bool, _>(0)
    }

    pub async fn history(&self) -> Vec<String> {
        let rows = sqlx::query(&format!(
            "SELECT id FROM {}.__postboard_migrations ORDER BY id",
            self.schema
        ))
        .fetch_all(&self.admin)
        .await
        .unwrap();
        rows.iter().map(|r| r.get::<String, _>("id")).collect()
    }

    pub async fn cleanup(self) {
        let _ = sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await;
        self.admin.close().await;
    }
}

/// A migrations directory populated with `(filename, sql)` pairs
pub fn migrations_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, sql) in files {
        fs::write(dir.path().join(name), sql).unwrap();
    }
    dir
}
