//! HTTP API handlers for cropdx-api

pub mod accounts;
pub mod auth;
pub mod detect;
pub mod detections;
pub mod diseases;
pub mod health;
pub mod info;
pub mod upload;

pub use auth::{require_auth, CurrentUser};
pub use health::health_routes;
