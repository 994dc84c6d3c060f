//! # CropDx Common Library
//!
//! Shared code for the CropDx detection service:
//! - Database schema, models and queries
//! - Password hashing and bearer token primitives
//! - Configuration loading
//! - Image heuristic and mock disease predictor
//! - English → Kinyarwanda translation

pub mod auth;
pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod translate;

pub use error::{Error, Result};
