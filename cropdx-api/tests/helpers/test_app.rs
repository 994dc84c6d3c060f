//! In-process application harness

use std::io::Cursor;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use cropdx_api::{build_app, AppState};
use cropdx_common::config::{ConfigOverrides, ServerConfig, TomlConfig};
use cropdx_common::db::{init_database, users};
use cropdx_common::detect::MockPredictor;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use tower_http::normalize_path::NormalizePath;

pub const TEST_PASSWORD: &str = "leafy-greens-42";

/// Application over a throwaway data directory
pub struct TestApp {
    pub app: NormalizePath<Router>,
    pub pool: SqlitePool,
    pub media_root: PathBuf,
    _dir: TempDir,
}

/// Registered user with live tokens
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub access: String,
    pub refresh: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build with a tweaked configuration
    pub async fn with_config(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let overrides = ConfigOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let mut config = ServerConfig::resolve(&overrides, TomlConfig::default());
        adjust(&mut config);
        config.ensure_directories().expect("directories");

        let pool = init_database(&config.database_path)
            .await
            .expect("database");
        let media_root = config.media_root.clone();

        let state = AppState::new(pool.clone(), config)
            .expect("state")
            .with_predictor(MockPredictor::seeded(2024));

        Self {
            app: build_app(state),
            pool,
            media_root,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("infallible")
    }

    /// Send and decode a JSON response
    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }

    /// Register through the API
    pub async fn register(&self, username: &str) -> TestUser {
        let (status, body) = self
            .send_json(json_request(
                "POST",
                "/api/register",
                None,
                json!({ "username": username, "password": TEST_PASSWORD }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_i64().expect("user id"),
            username: username.to_string(),
            access: body["access"].as_str().expect("access").to_string(),
            refresh: body["refresh"].as_str().expect("refresh").to_string(),
        }
    }

    /// Register and grant staff rights directly in the database
    pub async fn register_staff(&self, username: &str) -> TestUser {
        let user = self.register(username).await;
        users::set_staff(&self.pool, user.id, true)
            .await
            .expect("set staff");
        user
    }
}

/// Request with an optional JSON body and bearer token
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    if body.is_null() {
        builder.body(Body::empty()).unwrap()
    } else {
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

/// One part of a multipart form
pub enum MultipartPart<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

const BOUNDARY: &str = "cropdx-test-boundary";

/// `multipart/form-data` request built by hand
pub fn multipart_request(
    uri: &str,
    token: Option<&str>,
    parts: &[MultipartPart<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            MultipartPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            MultipartPart::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

/// Extract JSON body from response; empty bodies decode as null
pub async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("read body").to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Solid-color PNG
pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}
