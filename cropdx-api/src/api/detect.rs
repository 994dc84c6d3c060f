//! Mock disease detection
//!
//! Sequence: read the upload, run the crop heuristic, seed the catalog if
//! empty, pick a random disease, translate it, store the image and record
//! the result in the caller's history.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::post,
    Extension, Json, Router,
};
use cropdx_common::db::catalog::seed_catalog_if_empty;
use cropdx_common::db::{detections, diseases, Disease};
use cropdx_common::detect::{remove_upload, store_upload, validate_image, Prediction};
use cropdx_common::translate::{translate_disease, DiseaseTranslation};
use serde::Serialize;
use tracing::{debug, info};

use super::auth::CurrentUser;
use super::upload::UploadForm;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const NO_DISEASE_DATA: &str = "No disease data in system.";

/// Predicted disease as shown in detection results (no healthy image URL)
#[derive(Debug, Serialize)]
pub struct PredictedDisease {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub description: String,
    pub treatment: String,
    pub care_tips: String,
}

impl From<&Disease> for PredictedDisease {
    fn from(disease: &Disease) -> Self {
        Self {
            id: disease.id,
            name: disease.name.clone(),
            species: disease.species.clone(),
            description: disease.description.clone(),
            treatment: disease.treatment.clone(),
            care_tips: disease.care_tips.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub status: &'static str,
    pub id: i64,
    pub predicted_disease: Option<PredictedDisease>,
    pub confidence: f64,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub care_tips: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthy_example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<DiseaseTranslation>,
}

/// POST /api/ai-detect
pub async fn detect(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DetectResponse>> {
    let form = UploadForm::read(multipart?).await?;
    let image = form.require_image()?.clone();

    let detection_config = state.config.detection.clone();
    let bytes = image.clone();
    let check =
        tokio::task::spawn_blocking(move || validate_image(&bytes, &detection_config)).await??;
    debug!(
        format = ?check.format,
        width = check.width,
        height = check.height,
        "Upload passed crop check"
    );

    let seeded = seed_catalog_if_empty(&state.db).await?;
    if seeded > 0 {
        info!("Seeded {} catalog diseases", seeded);
    }
    let catalog = diseases::list_diseases(&state.db).await?;

    let prediction = {
        let mut predictor = state
            .predictor
            .lock()
            .map_err(|_| ApiError::Internal("Predictor lock poisoned".to_string()))?;
        predictor.predict(&catalog)
    };

    let translation = match &prediction {
        Some(p) => {
            let config = &state.config.translation;
            Some(
                translate_disease(
                    state.translator.as_ref(),
                    &p.disease,
                    &config.source_lang,
                    &config.target_lang,
                )
                .await,
            )
        }
        None => None,
    };

    let stored = store_upload(&state.config.media_root, check.extension(), &image).await?;
    let confidence = prediction.as_ref().map_or(0.0, |p| p.confidence);
    let record = match detections::insert_detection(
        &state.db,
        current.user.id,
        &stored,
        prediction.as_ref().map(|p| p.disease.id),
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

    info!(
        user_id = current.user.id,
        detection_id = record.id,
        disease = prediction.as_ref().map(|p| p.disease.name.as_str()).unwrap_or("none"),
        confidence,
        "Detection recorded"
    );

    Ok(Json(build_response(record.id, prediction, translation)))
}

fn build_response(
    id: i64,
    prediction: Option<Prediction>,
    translation: Option<DiseaseTranslation>,
) -> DetectResponse {
    match prediction {
        Some(Prediction {
            disease,
            confidence,
        }) => DetectResponse {
            status: "success",
            id,
            predicted_disease: Some(PredictedDisease::from(&disease)),
            confidence,
            recommendation: disease.treatment,
            crop_name: Some(disease.species),
            care_tips: Some(disease.care_tips),
            healthy_example: Some(disease.healthy_image_url),
            translation,
        },
        None => DetectResponse {
            status: "success",
            id,
            predicted_disease: None,
            confidence: 0.0,
            recommendation: NO_DISEASE_DATA.to_string(),
            crop_name: None,
            care_tips: None,
            healthy_example: None,
            translation: None,
        },
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai-detect", post(detect))
        .route("/api/detect", post(detect))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disease() -> Disease {
        Disease {
            id: 2,
            name: "Maize Leaf Blight".to_string(),
            species: "Maize".to_string(),
            description: "Fungal leaf spots reducing photosynthesis.".to_string(),
            treatment: "Rotate crops.".to_string(),
            healthy_image_url: "https://example.com/maize.jpg".to_string(),
            care_tips: "Timely weeding.".to_string(),
        }
    }

    #[test]
    fn test_response_with_prediction() {
        let prediction = Prediction {
            disease: disease(),
            confidence: 0.81,
        };
        let json = serde_json::to_value(build_response(5, Some(prediction), None)).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["id"], 5);
        assert_eq!(json["confidence"], 0.81);
        assert_eq!(json["recommendation"], "Rotate crops.");
        assert_eq!(json["crop_name"], "Maize");
        assert_eq!(json["healthy_example"], "https://example.com/maize.jpg");
        assert!(json["predicted_disease"].get("healthy_image_url").is_none());
        assert_eq!(json["predicted_disease"]["name"], "Maize Leaf Blight");
    }

    #[test]
    fn test_response_without_prediction() {
        let json = serde_json::to_value(build_response(9, None, None)).unwrap();

        assert!(json["predicted_disease"].is_null());
        assert_eq!(json["confidence"], 0.0);
        assert_eq!(json["recommendation"], NO_DISEASE_DATA);
        assert!(json.get("translation").is_none());
        assert!(json.get("crop_name").is_none());
    }
}
