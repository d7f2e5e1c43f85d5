#![allow(dead_code)]


use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tower::ServiceExt;

use threadstore::infra::db::Db;
use threadstore::store::{MemoryStore, PgStore};
use threadstore::AppState;

// ---------------------------------------------------------------------------
// Postgres store, schema prepared once per test binary
// ---------------------------------------------------------------------------

static PG_SCHEMA: OnceCell<String> = OnceCell::const_new();

/// Connect a fresh `PgStore` to the test database.
///
/// Returns `None` when `TEST_DATABASE_BASE_URL` is unset so the suite can run
/// without a database. Each call builds its own pool: every `#[tokio::test]`
/// has its own runtime and pooled connections do not survive it.
pub async fn pg_store() -> Option<PgStore> {
    let base_url = match std::env::var("TEST_DATABASE_BASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_BASE_URL not set, skipping postgres test");
            return None;
        }
    };
    let test_db = std::env::var("TEST_DATABASE_NAME").unwrap_or_else(|_| "threadstore_test".into());

    let database_url = PG_SCHEMA
        .get_or_init(|| async { prepare_database(&base_url, &test_db).await })
        .await;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .expect("cannot connect to test database");

    Some(PgStore::new(Db::from_pool(pool)))
}

async fn prepare_database(base_url: &str, test_db: &str) -> String {
    // ---- Create test database if needed ----
    let admin_pool = PgPool::connect(&format!("{}/postgres", base_url))
        .await
        .expect("cannot connect to postgres admin database");

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(test_db)
            .fetch_one(&admin_pool)
            .await
            .expect("failed to check test db existence");

    if !exists {
        // CREATE DATABASE cannot run inside a transaction
        sqlx::query(&format!("CREATE DATABASE \"{}\"", test_db))
            .execute(&admin_pool)
            .await
            .expect("failed to create test database");
    }
    admin_pool.close().await;

    let database_url = format!("{}/{}", base_url, test_db);
    let db_pool = PgPool::connect(&database_url)
        .await
        .expect("cannot connect to test database");

    // ---- Run migrations ----
    let mut migration_files: Vec<_> = std::fs::read_dir("migrations")
        .expect("cannot read migrations/")
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "sql"))
        .collect();
    migration_files.sort_by_key(|e| e.file_name());

    for entry in &migration_files {
        let sql = std::fs::read_to_string(entry.path())
            .unwrap_or_else(|_| panic!("cannot read {:?}", entry.path()));
        sqlx::raw_sql(&sql)
            .execute(&db_pool)
            .await
            .unwrap_or_else(|e| panic!("migration {:?} failed: {}", entry.file_name(), e));
    }

    // ---- Clean slate ----
    sqlx::raw_sql("TRUNCATE TABLE pairs, comments, posts")
        .execute(&db_pool)
        .await
        .expect("failed to truncate tables");

    db_pool.close().await;
    database_url
}

// ---------------------------------------------------------------------------
// TestApp: the router over a private in-memory store
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState {
            store: Arc::new(MemoryStore::new()),
            default_page_size: 20,
            max_page_size: 50,
        };
        let router = threadstore::http::router(state.clone());
        Self { router, state }
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Method::DELETE, path, None).await
    }

    /// Create a post through the API and return its id.
    pub async fn create_post(&self, comments_disabled: bool) -> String {
        let resp = self
            .post_json(
                "/posts",
                serde_json::json!({
                    "title": "A post",
                    "content": "Body",
                    "comments_disabled": comments_disabled,
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "create post failed");
        resp.json()["id"].as_str().unwrap().to_string()
    }

    /// Create a comment through the API and return its id.
    pub async fn create_comment(&self, post_id: &str, parent_id: Option<&str>, content: &str) -> String {
        let resp = self
            .post_json(
                &format!("/posts/{}/comments", post_id),
                serde_json::json!({ "parent_id": parent_id, "content": content }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "create comment failed");
        resp.json()["id"].as_str().unwrap().to_string()
    }
}
