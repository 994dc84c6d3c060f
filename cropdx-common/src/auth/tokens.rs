//! Bearer token issuance and validation
//!
//! # Token format
//!
//! - Raw token: 32 random bytes as 64 lowercase hex characters
//! - Stored form: SHA-256 of the raw token, 64 hex characters
//! - Access tokens are short-lived; refresh tokens are single-use and are
//!   revoked when exchanged for a new pair

use crate::config::AuthConfig;
use crate::db::models::{TokenKind, User};
use crate::db::{tokens as token_store, users};
use crate::{Error, Result};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Raw token length in bytes (before hex encoding)
pub const TOKEN_BYTES: usize = 32;

/// How long issued tokens stay valid
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl TokenLifetimes {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            access: Duration::minutes(config.access_token_minutes),
            refresh: Duration::days(config.refresh_token_days),
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// Freshly issued raw tokens; only ever shown to the client once
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Generate a random raw token
pub fn generate_raw_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Digest under which a raw token is stored
///
/// # Examples
///
/// ```
/// use cropdx_common::auth::hash_token;
///
/// let digest = hash_token("abc");
/// assert_eq!(digest.len(), 64);
/// assert_eq!(digest, hash_token("abc"));
/// ```
pub fn hash_token(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// Issue and persist a new access/refresh pair for a user
pub async fn issue_token_pair(
    pool: &SqlitePool,
    user_id: i64,
    lifetimes: TokenLifetimes,
) -> Result<TokenPair> {
    let access = generate_raw_token();
    let refresh = generate_raw_token();
    let now = Utc::now();

    token_store::store_token(
        pool,
        &hash_token(&access),
        user_id,
        TokenKind::Access,
        now + lifetimes.access,
    )
    .await?;
    token_store::store_token(
        pool,
        &hash_token(&refresh),
        user_id,
        TokenKind::Refresh,
        now + lifetimes.refresh,
    )
    .await?;

    debug!("Issued token pair for user {}", user_id);
    Ok(TokenPair { access, refresh })
}

/// Resolve a raw token of the expected kind to its user
async fn authenticate(pool: &SqlitePool, raw: &str, kind: TokenKind) -> Result<User> {
    let invalid = || Error::Unauthorized("Given token not valid for any token type".to_string());

    let stored = token_store::lookup_token(pool, &hash_token(raw))
        .await?
        .ok_or_else(invalid)?;

    if stored.kind != kind.as_str() || stored.revoked {
        return Err(invalid());
    }
    if stored.is_expired(Utc::now()) {
        return Err(Error::Unauthorized("Token is expired".to_string()));
    }

    match users::get_user(pool, stored.user_id).await {
        Ok(user) => Ok(user),
        Err(Error::NotFound(_)) => Err(Error::Unauthorized("User not found".to_string())),
        Err(e) => Err(e),
    }
}

/// Validate an access token from an `Authorization: Bearer` header
pub async fn authenticate_access(pool: &SqlitePool, raw: &str) -> Result<User> {
    authenticate(pool, raw, TokenKind::Access).await
}

/// Exchange a refresh token for a new pair, revoking the old refresh token
pub async fn rotate_refresh(
    pool: &SqlitePool,
    raw_refresh: &str,
    lifetimes: TokenLifetimes,
) -> Result<(User, TokenPair)> {
    let user = authenticate(pool, raw_refresh, TokenKind::Refresh).await?;

    // Losing a concurrent rotation leaves nothing to revoke
    if !token_store::revoke_token(pool, &hash_token(raw_refresh)).await? {
        return Err(Error::Unauthorized("Token is blacklisted".to_string()));
    }

    let pair = issue_token_pair(pool, user.id, lifetimes).await?;
    Ok((user, pair))
}

/// Revoke a raw token of either kind
pub async fn revoke(pool: &SqlitePool, raw: &str) -> Result<bool> {
    token_store::revoke_token(pool, &hash_token(raw)).await
}

/// Delete expired tokens every `period` until the task is dropped
///
/// The first pass runs immediately. Failures are logged and retried on the
/// next tick.
pub async fn prune_periodically(pool: SqlitePool, period: std::time::Duration) {
    let mut tick = tokio::time::interval(period);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tick.tick().await;
        match token_store::prune_expired_tokens(&pool, Utc::now()).await {
            Ok(0) => {}
            Ok(pruned) => info!("Pruned {} expired tokens", pruned),
            Err(e) => warn!("Token pruning failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_token_shape() {
        let token = generate_raw_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_raw_token());
    }

    #[test]
    fn test_hash_token_known_value() {
        // SHA-256("abc")
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_default_lifetimes() {
        let lifetimes = TokenLifetimes::default();
        assert_eq!(lifetimes.access, Duration::minutes(60));
        assert_eq!(lifetimes.refresh, Duration::days(7));
    }
}
