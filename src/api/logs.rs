//! Care log endpoints
//!
//! Log edits are authorized through the parent plant: a log belonging to
//! another user's plant yields 403, matching the distinction the plant
//! routes draw with 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::api::auth::CurrentUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::plant::{NewPlantLog, PlantLog};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddLogsRequest {
    #[serde(default)]
    pub logs: Vec<NewPlantLog>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLogRequest {
    pub log_type: Option<String>,
    pub log_value: Option<String>,
    pub log_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// POST /plants/{id}/logs
pub async fn add_logs(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plant_id): Path<i64>,
    Json(payload): Json<AddLogsRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    if payload.logs.is_empty() {
        return Err(ApiError::BadRequest(
            "Logs must be a non-empty array".to_string(),
        ));
    }

    let plant = db::plants::find_owned(&state.db, plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plant not found".to_string()))?;

    let count = db::logs::insert_logs(&state.db, plant.id, &payload.logs).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("{} logs added successfully", count) })),
    ))
}

/// PUT /logs/{id}
pub async fn update_log(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(log_id): Path<i64>,
    Json(payload): Json<UpdateLogRequest>,
) -> ApiResult<Json<PlantLog>> {
    let (log, owner_id) = db::logs::get_with_owner(&state.db, log_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Log entry not found".to_string()))?;

    if owner_id != user.user_id {
        return Err(ApiError::Forbidden(
            "Unauthorized to update this log".to_string(),
        ));
    }

    let updated = db::logs::update_log(
        &state.db,
        log.id,
        payload.log_type.as_deref(),
        payload.log_value.as_deref(),
        payload.log_date,
        payload.note.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Log entry not found".to_string()))?;

    Ok(Json(updated))
}

/// DELETE /logs/{id}
pub async fn delete_log(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(log_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let (log, owner_id) = db::logs::get_with_owner(&state.db, log_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Log entry not found".to_string()))?;

    if owner_id != user.user_id {
        return Err(ApiError::Forbidden(
            "Unauthorized to delete this log".to_string(),
        ));
    }

    db::logs::delete_log(&state.db, log.id).await?;

    Ok(Json(json!({ "message": "Log entry deleted successfully" })))
}

/// Build log routes (protected)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plants/:id/logs", post(add_logs))
        .route("/logs/:id", put(update_log).delete(delete_log))
}
