//! AI orchestration endpoints: recommendations and care tips
//!
//! Both return `{status: "cached"|"new", ...}` so clients can tell a
//! reused result from a fresh provider call.

use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::CurrentUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::ai::{CacheStatus, CareTip, Recommendation};
use crate::services::{care_tips, recommendation};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendRequest {
    /// Bypass the cache and always call the provider
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub status: CacheStatus,
    pub data: Recommendation,
}

#[derive(Debug, Serialize)]
pub struct CareTipsResponse {
    pub status: CacheStatus,
    #[serde(rename = "careTips")]
    pub care_tips: CareTip,
}

/// POST /plants/{id}/ai-recommendations
///
/// Body is optional; `{"force": true}` bypasses the cache.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plant_id): Path<i64>,
    payload: Option<Json<RecommendRequest>>,
) -> ApiResult<Json<RecommendResponse>> {
    let plant = db::plants::find_owned(&state.db, plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plant not found".to_string()))?;

    let force = payload.map(|Json(p)| p.force).unwrap_or(false);

    let outcome =
        recommendation::get_or_generate(&state.db, state.identifier.as_ref(), &plant, force)
            .await?;

    Ok(Json(RecommendResponse {
        status: outcome.status,
        data: outcome.recommendation,
    }))
}

/// POST /plants/{id}/care-tips
pub async fn generate_care_tips(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plant_id): Path<i64>,
) -> ApiResult<Json<CareTipsResponse>> {
    let plant = db::plants::find_owned(&state.db, plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plant not found".to_string()))?;

    let outcome = care_tips::get_or_generate(&state.db, state.tip_generator.as_ref(), &plant).await?;

    Ok(Json(CareTipsResponse {
        status: outcome.status,
        care_tips: outcome.care_tip,
    }))
}

/// Build AI routes (protected)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plants/:id/ai-recommendations", post(recommend))
        .route("/plants/:id/care-tips", post(generate_care_tips))
}
