//! Database models

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of `diseases.name` and `diseases.species`
pub const DISEASE_FIELD_MAX_LEN: usize = 100;

/// Maximum length of `users.username`
pub const USERNAME_MAX_LEN: usize = 150;

/// Registered account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_expert: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Public projection returned by the API
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            is_expert: self.is_expert,
        }
    }

    /// Staff and experts see every user's detection history
    pub fn sees_all_detections(&self) -> bool {
        self.is_staff || self.is_expert
    }
}

/// User fields safe to expose to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub is_expert: bool,
}

/// Check a username against the allowed character set and length
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::InvalidInput("username: This field may not be blank.".to_string()));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "username: Ensure this field has no more than {} characters.",
            USERNAME_MAX_LEN
        )));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(Error::InvalidInput(
            "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.".to_string(),
        ));
    }
    Ok(())
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Disease {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub description: String,
    pub treatment: String,
    pub healthy_image_url: String,
    pub care_tips: String,
}

/// Payload for creating or fully replacing a disease
#[derive(Debug, Clone, Deserialize)]
pub struct NewDisease {
    pub name: String,
    pub species: String,
    pub description: String,
    pub treatment: String,
    #[serde(default)]
    pub healthy_image_url: String,
    #[serde(default)]
    pub care_tips: String,
}

impl NewDisease {
    /// Field-level checks mirroring the column constraints
    pub fn validate(&self) -> Result<()> {
        validate_short_field("name", &self.name)?;
        validate_short_field("species", &self.species)?;
        validate_required_text("description", &self.description)?;
        validate_required_text("treatment", &self.treatment)?;
        validate_image_url(&self.healthy_image_url)?;
        Ok(())
    }
}

/// Partial update of a disease; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiseasePatch {
    pub name: Option<String>,
    pub species: Option<String>,
    pub description: Option<String>,
    pub treatment: Option<String>,
    pub healthy_image_url: Option<String>,
    pub care_tips: Option<String>,
}

impl DiseasePatch {
    /// Apply onto an existing disease, producing the replacement payload
    pub fn apply(self, current: &Disease) -> NewDisease {
        NewDisease {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            species: self.species.unwrap_or_else(|| current.species.clone()),
            description: self.description.unwrap_or_else(|| current.description.clone()),
            treatment: self.treatment.unwrap_or_else(|| current.treatment.clone()),
            healthy_image_url: self
                .healthy_image_url
                .unwrap_or_else(|| current.healthy_image_url.clone()),
            care_tips: self.care_tips.unwrap_or_else(|| current.care_tips.clone()),
        }
    }
}

fn validate_short_field(field: &str, value: &str) -> Result<()> {
    validate_required_text(field, value)?;
    if value.chars().count() > DISEASE_FIELD_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "{}: Ensure this field has no more than {} characters.",
            field, DISEASE_FIELD_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_required_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "{}: This field may not be blank.",
            field
        )));
    }
    Ok(())
}

fn validate_image_url(url: &str) -> Result<()> {
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }
    Err(Error::InvalidInput(
        "healthy_image_url: Enter a valid URL.".to_string(),
    ))
}

/// Stored detection row, without joins
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DetectionRecord {
    pub id: i64,
    pub user_id: i64,
    pub image: String,
    pub predicted_disease_id: Option<i64>,
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
}

/// Detection row joined with its owner and predicted disease
#[derive(Debug, Clone, Serialize)]
pub struct DetectionDetail {
    pub id: i64,
    pub user: UserSummary,
    pub predicted_disease: Option<Disease>,
    /// Path relative to the media root
    pub image: String,
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
}

/// Which detection rows a listing may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionScope {
    All,
    Owner(i64),
}

impl DetectionScope {
    pub fn for_user(user: &User) -> Self {
        if user.sees_all_detections() {
            DetectionScope::All
        } else {
            DetectionScope::Owner(user.id)
        }
    }
}

/// Access or refresh token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Stored token row (raw token is never persisted)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredToken {
    pub token_hash: String,
    pub user_id: i64,
    pub kind: String,
    /// Expiry as Unix seconds, so pruning is a single range delete
    pub expires_at: i64,
    pub revoked: bool,
}

impl StoredToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }
}
