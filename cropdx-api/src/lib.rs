//! cropdx-api library - HTTP service for the crop disease detection demo
//!
//! Routes, shared state and middleware live here so integration tests can
//! drive the full router without binding a socket.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::Router;
use cropdx_common::auth::TokenLifetimes;
use cropdx_common::config::{CorsConfig, ServerConfig};
use cropdx_common::detect::MockPredictor;
use cropdx_common::translate::{build_translator, Translator};
use sqlx::SqlitePool;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved service configuration
    pub config: Arc<ServerConfig>,
    /// English → Kinyarwanda translation backend
    pub translator: Arc<dyn Translator>,
    /// Random disease picker; the lock is never held across an await
    pub predictor: Arc<Mutex<MockPredictor>>,
    /// Access/refresh token validity
    pub lifetimes: TokenLifetimes,
    /// Service start, for uptime in the health response
    pub started_at: Instant,
}

impl AppState {
    /// Build state from a pool and configuration, using an entropy-seeded predictor
    pub fn new(db: SqlitePool, config: ServerConfig) -> cropdx_common::Result<Self> {
        let translator = build_translator(&config.translation)?;
        let lifetimes = TokenLifetimes::from_config(&config.auth);

        Ok(Self {
            db,
            config: Arc::new(config),
            translator,
            predictor: Arc::new(Mutex::new(MockPredictor::from_entropy())),
            lifetimes,
            started_at: Instant::now(),
        })
    }

    /// Replace the predictor (deterministic seeds in tests)
    pub fn with_predictor(mut self, predictor: MockPredictor) -> Self {
        self.predictor = Arc::new(Mutex::new(predictor));
        self
    }
}

/// Build application router
///
/// Health, API info, registration, login and token refresh are public;
/// everything else under `/api` requires a bearer access token.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    // Protected routes (require authentication)
    let protected = Router::new()
        .merge(api::accounts::protected_routes())
        .merge(api::diseases::routes())
        .merge(api::detections::routes())
        .merge(api::detect::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_auth,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .merge(api::info::routes())
        .merge(api::health::health_routes())
        .merge(api::accounts::public_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router wrapped so that `/api/diseases/` and `/api/diseases` are the same route
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

/// CORS policy: permissive when no origins are configured
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any)
}
