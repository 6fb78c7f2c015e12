#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use taskhub_api::auth::jwt::JwtConfig;
use taskhub_api::config::ServerConfig;
use taskhub_api::router::build_app_router;
use taskhub_api::state::AppState;
use taskhub_api::storage::LocalBlobStore;
use taskhub_api::ws::RoomRegistry;
use taskhub_db::MemoryStore;

pub const TEST_PASSWORD: &str = "secret123";

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        upload_dir: PathBuf::from("uploads"),
        max_upload_bytes: 1024,
        jwt: JwtConfig {
            secret: "test-secret-do-not-use".to_string(),
            expiry_days: 30,
        },
    }
}

/// A router over a fresh in-memory store, plus the state behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Upload root; removed on drop.
    pub uploads: TempDir,
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.upload_dir = uploads.path().to_path_buf();

    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config: Arc::new(config.clone()),
        rooms: Arc::new(RoomRegistry::new()),
        blobs: Arc::new(LocalBlobStore::new(uploads.path())),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
        uploads,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        self.request(Method::GET, uri, None, Some(token)).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: &str) -> Response<Body> {
        self.request(Method::POST, uri, Some(body), Some(token)).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: &str) -> Response<Body> {
        self.request(Method::PUT, uri, Some(body), Some(token)).await
    }

    pub async fn patch(&self, uri: &str, body: Value, token: &str) -> Response<Body> {
        self.request(Method::PATCH, uri, Some(body), Some(token)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response<Body> {
        self.request(Method::DELETE, uri, None, Some(token)).await
    }

    /// Register `username` (email `<username>@test.com`) and return `(token, user id)`.
    pub async fn register(&self, username: &str) -> (String, i64) {
        let body = json!({
            "username": username,
            "email": format!("{username}@test.com"),
            "password": TEST_PASSWORD,
        });
        let response = self
            .request(Method::POST, "/api/auth/register", Some(body), None)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let token = json["token"].as_str().unwrap().to_string();
        let id = json["data"]["id"].as_i64().unwrap();
        (token, id)
    }

    /// Create a project as the token holder and return its id.
    pub async fn create_project(&self, token: &str, name: &str) -> i64 {
        let response = self
            .post("/api/projects", json!({ "name": name }), token)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"]["id"].as_i64().unwrap()
    }

    /// Create a todo in `project` and return the created document.
    pub async fn create_todo(&self, token: &str, project: i64, body: Value) -> Value {
        let mut body = body;
        body["project"] = json!(project);
        let response = self.post("/api/todos", body, token).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"].clone()
    }
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
