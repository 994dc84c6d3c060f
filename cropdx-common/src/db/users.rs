//! User account queries

use crate::db::models::User;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, username, password_hash, is_expert, is_staff, date_joined";

/// Insert a new user; the password must already be hashed
///
/// Returns `Error::Conflict` when the username is taken.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    is_expert: bool,
) -> Result<User> {
    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, is_expert, is_staff, date_joined) VALUES (?, ?, ?, 0, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(is_expert)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::Conflict("A user with that username already exists.".to_string())
        }
        other => Error::Database(other),
    })?;

    get_user(pool, result.last_insert_rowid()).await
}

/// Fetch a user by primary key
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", id)))
}

/// Fetch a user by exact username
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Grant or remove staff rights
pub async fn set_staff(pool: &SqlitePool, id: i64, is_staff: bool) -> Result<()> {
    let result = sqlx::query("UPDATE users SET is_staff = ? WHERE id = ?")
        .bind(is_staff)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("user {}", id)));
    }
    Ok(())
}

/// Replace a user's password hash
pub async fn set_password_hash(pool: &SqlitePool, id: i64, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
