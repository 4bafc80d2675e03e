//! Plant CRUD endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::api::auth::CurrentUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::plant::{PlantDetail, PlantImageMeta, PlantWithImages};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePlantRequest {
    pub name: String,
    pub species: Option<String>,
    pub image_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlantRequest {
    pub name: Option<String>,
    pub species: Option<String>,
    pub image_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddImageRequest {
    pub image_base64: String,
}

fn decode_image(encoded: &str) -> ApiResult<Vec<u8>> {
    BASE64
        .decode(encoded.trim())
        .map_err(|_| ApiError::BadRequest("Invalid base64 image data".to_string()))
}

/// POST /plants
pub async fn create_plant(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreatePlantRequest>,
) -> ApiResult<(StatusCode, Json<PlantWithImages>)> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Plant name is required".to_string()));
    }

    let image_data = payload
        .image_base64
        .as_deref()
        .map(decode_image)
        .transpose()?;

    let plant = db::plants::create_plant(
        &state.db,
        user.user_id,
        &payload.name,
        payload.species.as_deref(),
        image_data.as_deref(),
    )
    .await?;

    info!(plant_id = plant.plant.id, user_id = user.user_id, "Plant created");

    Ok((StatusCode::CREATED, Json(plant)))
}

/// GET /plants
pub async fn list_plants(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<PlantWithImages>>> {
    let plants = db::plants::list_plants(&state.db, user.user_id).await?;
    Ok(Json(plants))
}

/// GET /plants/{id}
pub async fn get_plant(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plant_id): Path<i64>,
) -> ApiResult<Json<PlantDetail>> {
    let detail = db::plants::get_detail(&state.db, plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plant not found".to_string()))?;

    Ok(Json(detail))
}

/// PUT /plants/{id}
pub async fn update_plant(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plant_id): Path<i64>,
    Json(payload): Json<UpdatePlantRequest>,
) -> ApiResult<Json<PlantWithImages>> {
    let plant = db::plants::find_owned(&state.db, plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plant not found".to_string()))?;

    db::plants::update_plant(
        &state.db,
        plant.id,
        payload.name.as_deref(),
        payload.species.as_deref(),
    )
    .await?;

    if let Some(encoded) = payload.image_base64.as_deref() {
        let data = decode_image(encoded)?;
        db::images::insert_image(&state.db, plant.id, &data).await?;
    }

    let plant = db::plants::find_owned(&state.db, plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plant not found".to_string()))?;
    let images = db::images::list_meta(&state.db, plant_id).await?;

    Ok(Json(PlantWithImages { plant, images }))
}

/// DELETE /plants/{id}
pub async fn delete_plant(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plant_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let plant = db::plants::find_owned(&state.db, plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plant not found".to_string()))?;

    db::plants::delete_plant(&state.db, plant.id).await?;

    info!(plant_id, user_id = user.user_id, "Plant deleted");

    Ok(Json(json!({ "message": "Plant deleted successfully" })))
}

/// POST /plants/{id}/images
pub async fn add_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plant_id): Path<i64>,
    Json(payload): Json<AddImageRequest>,
) -> ApiResult<(StatusCode, Json<PlantImageMeta>)> {
    let plant = db::plants::find_owned(&state.db, plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plant not found".to_string()))?;

    let data = decode_image(&payload.image_base64)?;
    let meta = db::images::insert_image(&state.db, plant.id, &data).await?;

    Ok((StatusCode::CREATED, Json(meta)))
}

/// Build plant routes (protected)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plants", post(create_plant).get(list_plants))
        .route(
            "/plants/:id",
            get(get_plant).put(update_plant).delete(delete_plant),
        )
        .route("/plants/:id/images", post(add_image))
}
