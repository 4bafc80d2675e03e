//! Raw image retrieval

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Extension, Router,
};

use crate::api::auth::CurrentUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /images/{id}
///
/// Serves the stored blob. No mime type is stored alongside the bytes,
/// so image/jpeg is assumed; browsers sniff the real type.
pub async fn get_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(image_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let image = db::images::get_image(&state.db, image_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Image not found".to_string()))?;

    // Reachability is through the owning plant
    db::plants::find_owned(&state.db, image.plant_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Image not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], image.data))
}

/// Build image routes (protected)
pub fn routes() -> Router<AppState> {
    Router::new().route("/images/:id", get(get_image))
}
