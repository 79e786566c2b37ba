//! Test harness for driving the router in-process.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pdf_engine_server::config::Config;
use pdf_engine_server::db::{create_pool, UserRepository};
use pdf_engine_server::pdf::PageRasterizer;
use pdf_engine_server::state::AppState;

pub const ADMIN_KEY: &str = "admin-test-key-0000000000000000000000";
pub const ALICE_KEY: &str = "alice-test-key-0000000000000000000000";
pub const BOB_KEY: &str = "bob-test-key-00000000000000000000000000";

const BOUNDARY: &str = "pdf-engine-test-boundary";

/// One isolated server: temp storage, in-memory database, three users.
pub struct TestApp {
    /// Keeps the storage directories alive for the test's duration.
    _temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Build with a custom page rasterizer
    pub async fn with_rasterizer(rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self::build(Some(rasterizer)).await
    }

    async fn build(rasterizer: Option<Arc<dyn PageRasterizer>>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads");
        let processed_dir = temp_dir.path().join("processed");
        std::fs::create_dir_all(&upload_dir).expect("Failed to create uploads");
        std::fs::create_dir_all(&processed_dir).expect("Failed to create processed");

        let mut config = Config::default();
        config.database.url = "sqlite::memory:".to_string();
        config.storage.upload_dir = upload_dir.clone();
        config.storage.processed_dir = processed_dir.clone();

        let pool = create_pool(&config.database.url).await.expect("Failed to create pool");
        let users = UserRepository::new(&pool);
        users
            .ensure_bootstrap_user(ADMIN_KEY)
            .await
            .expect("Failed to bootstrap admin");
        users.create("alice", ALICE_KEY, false).await.expect("Failed to create alice");
        users.create("bob", BOB_KEY, false).await.expect("Failed to create bob");

        let state = match rasterizer {
            Some(rasterizer) => AppState::with_rasterizer(config, pool, rasterizer),
            None => AppState::new(config, pool),
        }
        .expect("Failed to create state");

        let router = pdf_engine_server::build_router(state.clone());

        Self {
            _temp_dir: temp_dir,
            upload_dir,
            processed_dir,
            state,
            router,
        }
    }

    /// Send a raw request through the router
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }

    /// Send a request with an optional API key and JSON body, returning the
    /// status and the parsed JSON response.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        api_key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = api_key {
            builder = builder.header("X-API-Key", key);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).unwrap()).await;
        let status = response.status();
        (status, Self::read_json(response).await)
    }

    pub async fn post(&self, uri: &str, api_key: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, Some(api_key), Some(body)).await
    }

    pub async fn get(&self, uri: &str, api_key: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, Some(api_key), None).await
    }

    /// Upload `bytes` as the multipart `file` field
    pub async fn upload(&self, api_key: &str, filename: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::with_capacity(bytes.len() + 256);
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header("X-API-Key", api_key)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = self.send(request).await;
        let status = response.status();
        (status, Self::read_json(response).await)
    }

    /// Upload a generated PDF and return its stored filename
    pub async fn upload_sample(&self, api_key: &str, filename: &str, pages: usize) -> String {
        let (status, body) = self
            .upload(api_key, filename, &super::sample_pdf(pages, None))
            .await;
        assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
        body["filename"].as_str().expect("filename").to_string()
    }

    /// Download a processed file, returning status, headers and bytes
    pub async fn download(&self, api_key: &str, filename: &str) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let request = Request::builder()
            .uri(format!("/api/download/{}", filename))
            .header("X-API-Key", api_key)
            .body(Body::empty())
            .unwrap();

        let response = self.send(request).await;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, bytes.to_vec())
    }

    pub async fn job_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processing_jobs")
            .fetch_one(self.state.db())
            .await
            .unwrap();
        count
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        }
    }
}
