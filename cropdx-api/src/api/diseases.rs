//! Disease catalog CRUD

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use cropdx_common::db::{diseases, Disease, DiseasePatch, NewDisease};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

/// GET /api/diseases
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Disease>>> {
    Ok(Json(diseases::list_diseases(&state.db).await?))
}

/// POST /api/diseases
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewDisease>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Disease>)> {
    let Json(new_disease) = payload?;
    let disease = diseases::create_disease(&state.db, &new_disease).await?;
    info!("Created disease {} ({})", disease.id, disease.name);
    Ok((StatusCode::CREATED, Json(disease)))
}

/// GET /api/diseases/:id
pub async fn retrieve(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Disease>> {
    let Path(id) = path?;
    Ok(Json(diseases::get_disease(&state.db, id).await?))
}

/// PUT /api/diseases/:id
pub async fn replace(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewDisease>, JsonRejection>,
) -> ApiResult<Json<Disease>> {
    let Path(id) = path?;
    let Json(replacement) = payload?;
    Ok(Json(diseases::update_disease(&state.db, id, &replacement).await?))
}

/// PATCH /api/diseases/:id
pub async fn patch(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<DiseasePatch>, JsonRejection>,
) -> ApiResult<Json<Disease>> {
    let Path(id) = path?;
    let Json(changes) = payload?;
    Ok(Json(diseases::patch_disease(&state.db, id, changes).await?))
}

/// DELETE /api/diseases/:id
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    diseases::delete_disease(&state.db, id).await?;
    info!("Deleted disease {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/diseases", get(list).post(create))
        .route(
            "/api/diseases/:id",
            get(retrieve).put(replace).patch(patch).delete(delete),
        )
}
