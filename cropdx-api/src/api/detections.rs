//! Detection history resource
//!
//! Staff and expert users see every record; everyone else sees only their
//! own. Updates and deletes by a non-owner without those rights get 403.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use cropdx_common::db::{
    detections, diseases, DetectionDetail, DetectionRecord, DetectionScope, User,
};
use cropdx_common::detect::{inspect_image, remove_upload, store_upload};
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::auth::CurrentUser;
use super::upload::UploadForm;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// JSON body for PATCH/PUT
#[derive(Debug, Default, Deserialize)]
pub struct DetectionUpdate {
    pub confidence: Option<f64>,
    /// Absent leaves the disease alone; `null` clears it
    #[serde(default, deserialize_with = "present")]
    pub predicted_disease: Option<Option<i64>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

fn check_confidence(value: f64) -> ApiResult<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ApiError::BadRequest(
            "confidence: Ensure this value is between 0 and 1.".to_string(),
        ));
    }
    Ok(value)
}

/// Resolve a disease reference supplied by a client
async fn check_disease(state: &AppState, id: i64) -> ApiResult<i64> {
    match diseases::get_disease(&state.db, id).await {
        Ok(disease) => Ok(disease.id),
        Err(cropdx_common::Error::NotFound(_)) => Err(ApiError::BadRequest(format!(
            "predicted_disease: Invalid pk \"{}\" - object does not exist.",
            id
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Load a record the caller is about to modify
async fn owned_record(state: &AppState, user: &User, id: i64) -> ApiResult<DetectionRecord> {
    let record = detections::get_detection_record(&state.db, id).await?;
    if record.user_id != user.id && !user.sees_all_detections() {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ));
    }
    Ok(record)
}

/// GET /api/detections
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<DetectionDetail>>> {
    let scope = DetectionScope::for_user(&current.user);
    Ok(Json(detections::list_detections(&state.db, scope).await?))
}

/// POST /api/detections (multipart: image, confidence, predicted_disease?)
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<DetectionDetail>)> {
    let form = UploadForm::read(multipart?).await?;
    let image = form.require_image()?;

    let confidence = form
        .text("confidence")
        .ok_or_else(|| ApiError::BadRequest("confidence: This field is required.".to_string()))?
        .parse::<f64>()
        .map_err(|_| ApiError::BadRequest("confidence: A valid number is required.".to_string()))?;
    let confidence = check_confidence(confidence)?;

    let predicted_disease_id = match form.text("predicted_disease") {
        Some(raw) => {
            let id = raw.parse::<i64>().map_err(|_| {
                ApiError::BadRequest("predicted_disease: Incorrect type.".to_string())
            })?;
            Some(check_disease(&state, id).await?)
        }
        None => None,
    };

    let check = inspect_image(image)?;
    let stored = store_upload(&state.config.media_root, check.extension(), image).await?;

    let record = match detections::insert_detection(
        &state.db,
        current.user.id,
        &stored,
        predicted_disease_id,
        confidence,
    )
    .await
    {
        Ok(record) => record,
        Err(e) => {
            remove_upload(&state.config.media_root, &stored).await;
            return Err(e.into());
        }
    };
    info!("User {} saved detection {}", current.user.id, record.id);

    let detail = detections::get_detection(&state.db, record.id, DetectionScope::All).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/detections/:id
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<DetectionDetail>> {
    let Path(id) = path?;
    let scope = DetectionScope::for_user(&current.user);
    Ok(Json(detections::get_detection(&state.db, id, scope).await?))
}

/// PATCH or PUT /api/detections/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DetectionUpdate>, JsonRejection>,
) -> ApiResult<Json<DetectionDetail>> {
    let Path(id) = path?;
    let Json(changes) = payload?;
    owned_record(&state, &current.user, id).await?;

    let confidence = changes.confidence.map(check_confidence).transpose()?;
    let predicted_disease = match changes.predicted_disease {
        Some(Some(disease_id)) => Some(Some(check_disease(&state, disease_id).await?)),
        other => other,
    };

    detections::update_detection(&state.db, id, confidence, predicted_disease).await?;
    let detail = detections::get_detection(&state.db, id, DetectionScope::All).await?;
    Ok(Json(detail))
}

/// DELETE /api/detections/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    owned_record(&state, &current.user, id).await?;

    let removed = detections::delete_detection(&state.db, id).await?;
    remove_upload(&state.config.media_root, &removed.image).await;

    info!("User {} deleted detection {}", current.user.id, id);
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/detections", get(list).post(create))
        .route("/api/history", get(list).post(create))
        .route(
            "/api/detections/:id",
            get(retrieve).patch(update).put(update).delete(delete),
        )
        .route(
            "/api/history/:id",
            get(retrieve).patch(update).put(update).delete(delete),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_body_distinguishes_null_from_absent() {
        let absent: DetectionUpdate = serde_json::from_str(r#"{"confidence": 0.5}"#).unwrap();
        assert_eq!(absent.predicted_disease, None);

        let cleared: DetectionUpdate = serde_json::from_str(r#"{"predicted_disease": null}"#).unwrap();
        assert_eq!(cleared.predicted_disease, Some(None));

        let set: DetectionUpdate = serde_json::from_str(r#"{"predicted_disease": 3}"#).unwrap();
        assert_eq!(set.predicted_disease, Some(Some(3)));
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(check_confidence(0.0).is_ok());
        assert!(check_confidence(1.0).is_ok());
        assert!(check_confidence(1.01).is_err());
        assert!(check_confidence(-0.1).is_err());
        assert!(check_confidence(f64::NAN).is_err());
    }
}
