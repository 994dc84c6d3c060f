//! Database models and queries

pub mod catalog;
pub mod detections;
pub mod diseases;
pub mod init;
pub mod models;
pub mod settings;
pub mod tokens;
pub mod users;

pub use init::init_database;
pub use models::*;
