//! Bearer token storage
//!
//! Only SHA-256 digests of tokens are stored; see `auth::tokens` for issuance.

use crate::db::models::{StoredToken, TokenKind};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Persist a token digest
pub async fn store_token(
    pool: &SqlitePool,
    token_hash: &str,
    user_id: i64,
    kind: TokenKind,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO auth_tokens (token_hash, user_id, kind, expires_at, revoked, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(kind.as_str())
    .bind(expires_at.timestamp())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a token digest
pub async fn lookup_token(pool: &SqlitePool, token_hash: &str) -> Result<Option<StoredToken>> {
    let token = sqlx::query_as::<_, StoredToken>(
        "SELECT token_hash, user_id, kind, expires_at, revoked FROM auth_tokens WHERE token_hash = ?",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(token)
}

/// Mark a token as revoked
///
/// Returns false when the token was unknown or already revoked.
pub async fn revoke_token(pool: &SqlitePool, token_hash: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE auth_tokens SET revoked = 1 WHERE token_hash = ? AND revoked = 0")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Revoke every live token of a user
pub async fn revoke_user_tokens(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("UPDATE auth_tokens SET revoked = 1 WHERE user_id = ? AND revoked = 0")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Delete tokens whose expiry has passed
pub async fn prune_expired_tokens(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= ?")
        .bind(now.timestamp())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
