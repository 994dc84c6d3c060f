//! Test helpers for cropdx-api integration tests
//!
//! - TestApp: router over a temporary database and media root
//! - Request builders for JSON and multipart bodies
//! - PNG fixtures for the crop heuristic

#![allow(dead_code)]

pub mod test_app;

// Each test binary compiles this module and uses a different subset
#[allow(unused_imports)]
pub use test_app::{json_request, multipart_request, png_bytes, MultipartPart, TestApp};
