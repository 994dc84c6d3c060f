//! Disease catalog queries

use crate::db::models::{Disease, DiseasePatch, NewDisease};
use crate::{Error, Result};
use sqlx::SqlitePool;

const DISEASE_COLUMNS: &str =
    "id, name, species, description, treatment, healthy_image_url, care_tips";

/// All diseases, ordered by id
pub async fn list_diseases(pool: &SqlitePool) -> Result<Vec<Disease>> {
    let diseases = sqlx::query_as::<_, Disease>(&format!(
        "SELECT {} FROM diseases ORDER BY id",
        DISEASE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(diseases)
}

/// Number of catalog rows
pub async fn count_diseases(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM diseases")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Fetch one disease
pub async fn get_disease(pool: &SqlitePool, id: i64) -> Result<Disease> {
    sqlx::query_as::<_, Disease>(&format!(
        "SELECT {} FROM diseases WHERE id = ?",
        DISEASE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("disease {}", id)))
}

/// Insert a validated disease
pub async fn create_disease(pool: &SqlitePool, disease: &NewDisease) -> Result<Disease> {
    disease.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO diseases (name, species, description, treatment, healthy_image_url, care_tips)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&disease.name)
    .bind(&disease.species)
    .bind(&disease.description)
    .bind(&disease.treatment)
    .bind(&disease.healthy_image_url)
    .bind(&disease.care_tips)
    .execute(pool)
    .await?;

    get_disease(pool, result.last_insert_rowid()).await
}

/// Replace every field of an existing disease
pub async fn update_disease(pool: &SqlitePool, id: i64, disease: &NewDisease) -> Result<Disease> {
    disease.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE diseases
        SET name = ?, species = ?, description = ?, treatment = ?, healthy_image_url = ?, care_tips = ?
        WHERE id = ?
        "#,
    )
    .bind(&disease.name)
    .bind(&disease.species)
    .bind(&disease.description)
    .bind(&disease.treatment)
    .bind(&disease.healthy_image_url)
    .bind(&disease.care_tips)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("disease {}", id)));
    }

    get_disease(pool, id).await
}

/// Apply a partial update; absent fields keep their stored values
pub async fn patch_disease(pool: &SqlitePool, id: i64, patch: DiseasePatch) -> Result<Disease> {
    let current = get_disease(pool, id).await?;
    update_disease(pool, id, &patch.apply(&current)).await
}

/// Delete a disease; detections pointing at it keep a null reference
pub async fn delete_disease(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM diseases WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("disease {}", id)));
    }
    Ok(())
}

/// Look up by `(name, species)` and insert only if absent
///
/// Returns the disease and whether it was created.
pub async fn get_or_create_disease(pool: &SqlitePool, disease: &NewDisease) -> Result<(Disease, bool)> {
    let existing = sqlx::query_as::<_, Disease>(&format!(
        "SELECT {} FROM diseases WHERE name = ? AND species = ? ORDER BY id LIMIT 1",
        DISEASE_COLUMNS
    ))
    .bind(&disease.name)
    .bind(&disease.species)
    .fetch_optional(pool)
    .await?;

    match existing {
        Some(found) => Ok((found, false)),
        None => Ok((create_disease(pool, disease).await?, true)),
    }
}
