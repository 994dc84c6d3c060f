//! Detection history queries

use crate::db::models::{DetectionDetail, DetectionRecord, DetectionScope, Disease, UserSummary};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Flat row from the history ⋈ users ⟕ diseases join
#[derive(Debug, sqlx::FromRow)]
struct DetectionJoinRow {
    id: i64,
    user_id: i64,
    image: String,
    confidence: f64,
    detected_at: DateTime<Utc>,
    username: String,
    is_expert: bool,
    disease_id: Option<i64>,
    disease_name: Option<String>,
    disease_species: Option<String>,
    disease_description: Option<String>,
    disease_treatment: Option<String>,
    disease_healthy_image_url: Option<String>,
    disease_care_tips: Option<String>,
}

impl DetectionJoinRow {
    fn into_detail(self) -> DetectionDetail {
        let predicted_disease = self.disease_id.map(|id| Disease {
            id,
            name: self.disease_name.unwrap_or_default(),
            species: self.disease_species.unwrap_or_default(),
            description: self.disease_description.unwrap_or_default(),
            treatment: self.disease_treatment.unwrap_or_default(),
            healthy_image_url: self.disease_healthy_image_url.unwrap_or_default(),
            care_tips: self.disease_care_tips.unwrap_or_default(),
        });

        DetectionDetail {
            id: self.id,
            user: UserSummary {
                id: self.user_id,
                username: self.username,
                is_expert: self.is_expert,
            },
            predicted_disease,
            image: self.image,
            confidence: self.confidence,
            detected_at: self.detected_at,
        }
    }
}

const DETAIL_SELECT: &str = r#"
    SELECT
        h.id, h.user_id, h.image, h.confidence, h.detected_at,
        u.username, u.is_expert,
        d.id AS disease_id,
        d.name AS disease_name,
        d.species AS disease_species,
        d.description AS disease_description,
        d.treatment AS disease_treatment,
        d.healthy_image_url AS disease_healthy_image_url,
        d.care_tips AS disease_care_tips
    FROM detection_history h
    JOIN users u ON u.id = h.user_id
    LEFT JOIN diseases d ON d.id = h.predicted_disease_id
"#;

/// Record a detection
pub async fn insert_detection(
    pool: &SqlitePool,
    user_id: i64,
    image: &str,
    predicted_disease_id: Option<i64>,
    confidence: f64,
) -> Result<DetectionRecord> {
    let detected_at = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO detection_history (user_id, image, predicted_disease_id, confidence, detected_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(image)
    .bind(predicted_disease_id)
    .bind(confidence)
    .bind(detected_at)
    .execute(pool)
    .await?;

    get_detection_record(pool, result.last_insert_rowid()).await
}

/// Raw row without joins, regardless of owner
pub async fn get_detection_record(pool: &SqlitePool, id: i64) -> Result<DetectionRecord> {
    sqlx::query_as::<_, DetectionRecord>(
        "SELECT id, user_id, image, predicted_disease_id, confidence, detected_at FROM detection_history WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("detection {}", id)))
}

/// History visible to the given scope, newest first
pub async fn list_detections(pool: &SqlitePool, scope: DetectionScope) -> Result<Vec<DetectionDetail>> {
    let rows = match scope {
        DetectionScope::All => {
            sqlx::query_as::<_, DetectionJoinRow>(&format!(
                "{} ORDER BY h.id DESC",
                DETAIL_SELECT
            ))
            .fetch_all(pool)
            .await?
        }
        DetectionScope::Owner(user_id) => {
            sqlx::query_as::<_, DetectionJoinRow>(&format!(
                "{} WHERE h.user_id = ? ORDER BY h.id DESC",
                DETAIL_SELECT
            ))
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(DetectionJoinRow::into_detail).collect())
}

/// One joined detection within the given scope
///
/// Rows outside the scope are reported as not found.
pub async fn get_detection(pool: &SqlitePool, id: i64, scope: DetectionScope) -> Result<DetectionDetail> {
    let row = sqlx::query_as::<_, DetectionJoinRow>(&format!("{} WHERE h.id = ?", DETAIL_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match (row, scope) {
        (Some(row), DetectionScope::All) => Ok(row.into_detail()),
        (Some(row), DetectionScope::Owner(owner)) if row.user_id == owner => Ok(row.into_detail()),
        _ => Err(Error::NotFound(format!("detection {}", id))),
    }
}

/// Change confidence and/or predicted disease
///
/// `predicted_disease_id` of `Some(None)` clears the reference.
pub async fn update_detection(
    pool: &SqlitePool,
    id: i64,
    confidence: Option<f64>,
    predicted_disease_id: Option<Option<i64>>,
) -> Result<DetectionRecord> {
    let current = get_detection_record(pool, id).await?;

    let confidence = confidence.unwrap_or(current.confidence);
    let predicted_disease_id = predicted_disease_id.unwrap_or(current.predicted_disease_id);

    sqlx::query("UPDATE detection_history SET confidence = ?, predicted_disease_id = ? WHERE id = ?")
        .bind(confidence)
        .bind(predicted_disease_id)
        .bind(id)
        .execute(pool)
        .await?;

    get_detection_record(pool, id).await
}

/// Delete a detection row, returning it so the caller can remove its image
pub async fn delete_detection(pool: &SqlitePool, id: i64) -> Result<DetectionRecord> {
    let record = get_detection_record(pool, id).await?;

    sqlx::query("DELETE FROM detection_history WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(record)
}
