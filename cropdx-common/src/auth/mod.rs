//! Authentication primitives
//!
//! Pure functions and database operations only; the HTTP middleware that
//! wraps them lives in the API crate.

pub mod password;
pub mod tokens;

pub use password::{hash_password, validate_password, verify_login, verify_password};
pub use tokens::{
    authenticate_access, hash_token, issue_token_pair, prune_periodically, revoke, rotate_refresh,
    TokenLifetimes, TokenPair,
};
