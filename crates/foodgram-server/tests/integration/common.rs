use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tempfile::TempDir;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tower::ServiceExt;

use foodgram_core::{MediaStore, RecipeLimits};
use foodgram_db::Database;
use foodgram_server::routes;
use foodgram_server::state::AppState;

/// 1x1 transparent PNG.
pub const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub media: TempDir,
    _container: ContainerAsync<GenericImage>,
}

/// Spin up a PostgreSQL container and return the app wired to it.
pub async fn setup_test_app() -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "foodgram_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/foodgram_test");
    let pool = retry_connect(&url).await;

    let db = Database::from_pool(pool.clone());
    db.migrate().await.expect("Failed to run migrations");

    let media = tempfile::tempdir().expect("Failed to create media dir");
    let state = Arc::new(AppState {
        db,
        media: MediaStore::new(media.path(), "/media/"),
        limits: RecipeLimits::default(),
        max_body_bytes: 1024 * 1024,
    });

    TestApp {
        router: routes::router(state),
        pool,
        media,
        _container: container,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}

impl TestApp {
    /// Send a request, returning the status and the body parsed as JSON
    /// (`Null` for empty bodies).
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = self.call_raw(method, uri, token, body).await;
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response is JSON")
        };
        (status, json)
    }

    pub async fn call_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Token {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    /// Register `name` and return a fresh auth token for them.
    pub async fn sign_up(&self, name: &str) -> (i64, String) {
        let (status, user) = self
            .call(
                "POST",
                "/api/users/",
                None,
                Some(serde_json::json!({
                    "email": format!("{name}@example.com"),
                    "username": name,
                    "first_name": name,
                    "last_name": "Tester",
                    "password": format!("secret-{name}-pw"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");

        let (status, token) = self
            .call(
                "POST",
                "/api/auth/token/login/",
                None,
                Some(serde_json::json!({
                    "email": format!("{name}@example.com"),
                    "password": format!("secret-{name}-pw"),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{token}");

        (
            user["id"].as_i64().unwrap(),
            token["auth_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn insert_tag(&self, name: &str, slug: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO tags (name, color, slug) VALUES ($1, '#E26C2D', $2) RETURNING id")
            .bind(name)
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn insert_ingredient(&self, name: &str, unit: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(unit)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }
}
