//! User profile endpoints

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::api::auth::CurrentUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::user::UserProfile;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadProfileImageRequest {
    pub image_base64: String,
}

/// GET /users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<UserProfile>> {
    let profile = db::users::get_profile(&state.db, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// PUT /users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    let profile = db::users::update_profile(
        &state.db,
        user.user_id,
        payload.name.as_deref(),
        payload.email.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}

/// POST /users/profile/image
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UploadProfileImageRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let data = BASE64
        .decode(payload.image_base64.trim())
        .map_err(|_| ApiError::BadRequest("Invalid base64 image data".to_string()))?;

    if data.is_empty() {
        return Err(ApiError::BadRequest("No image data provided".to_string()));
    }

    db::users::set_profile_image(&state.db, user.user_id, &data).await?;

    Ok(Json(json!({
        "message": "Profile image uploaded successfully",
        "profileImageUrl": format!("/users/profile-image/{}", user.user_id),
    })))
}

/// DELETE /users/profile/image
pub async fn delete_profile_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<serde_json::Value>> {
    db::users::clear_profile_image(&state.db, user.user_id).await?;

    Ok(Json(json!({ "message": "Profile image removed successfully" })))
}

/// GET /users/profile-image/{user_id}
///
/// Publicly reachable by user id, no token required.
pub async fn get_profile_image(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let image = db::users::get_profile_image(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile image not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], image))
}

/// Build protected profile routes
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(get_profile).put(update_profile))
        .route(
            "/users/profile/image",
            post(upload_profile_image).delete(delete_profile_image),
        )
}

/// Build public profile routes
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/users/profile-image/:user_id", get(get_profile_image))
}
