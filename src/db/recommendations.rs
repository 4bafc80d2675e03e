//! AI recommendation database operations
//!
//! The cache identity key of a recommendation is the image it was computed
//! from: a stored row whose `image_id` equals the plant's current latest
//! image is reusable.

use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::db::{now_timestamp, parse_timestamp};
use crate::error::{ApiError, ApiResult};
use crate::models::ai::Recommendation;

fn recommendation_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<Recommendation> {
    let created_at: String = row.get("created_at");
    let result_json: String = row.get("result_json");
    let result = serde_json::from_str(&result_json)
        .map_err(|e| ApiError::Internal(format!("Failed to parse stored result: {}", e)))?;

    Ok(Recommendation {
        id: row.get("id"),
        plant_id: row.get("plant_id"),
        image_id: row.get("image_id"),
        species: row.get("species"),
        diseases: row.get("diseases"),
        result,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// The most recent recommendation computed from the given image, if any
pub async fn find_for_image(
    pool: &SqlitePool,
    image_id: i64,
) -> ApiResult<Option<Recommendation>> {
    let row = sqlx::query(
        r#"
        SELECT id, plant_id, image_id, species, diseases, result_json, created_at
        FROM ai_recommendations
        WHERE image_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(image_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(recommendation_from_row).transpose()
}

/// The plant's most recent recommendation, if any
pub async fn latest_for_plant(
    pool: &SqlitePool,
    plant_id: i64,
) -> ApiResult<Option<Recommendation>> {
    let row = sqlx::query(
        r#"
        SELECT id, plant_id, image_id, species, diseases, result_json, created_at
        FROM ai_recommendations
        WHERE plant_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(plant_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(recommendation_from_row).transpose()
}

/// All recommendations for a plant, newest first
pub async fn list_for_plant(pool: &SqlitePool, plant_id: i64) -> ApiResult<Vec<Recommendation>> {
    let rows = sqlx::query(
        r#"
        SELECT id, plant_id, image_id, species, diseases, result_json, created_at
        FROM ai_recommendations
        WHERE plant_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(plant_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(recommendation_from_row).collect()
}

/// Insert a new recommendation row inside an enclosing transaction
pub async fn insert_tx(
    tx: &mut Transaction<'_, Sqlite>,
    plant_id: i64,
    image_id: i64,
    species: Option<&str>,
    diseases: Option<&str>,
    result: &serde_json::Value,
) -> ApiResult<Recommendation> {
    let now = now_timestamp();
    let result_json = result.to_string();

    let insert = sqlx::query(
        r#"
        INSERT INTO ai_recommendations (plant_id, image_id, species, diseases, result_json, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(plant_id)
    .bind(image_id)
    .bind(species)
    .bind(diseases)
    .bind(&result_json)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    Ok(Recommendation {
        id: insert.last_insert_rowid(),
        plant_id,
        image_id,
        species: species.map(str::to_string),
        diseases: diseases.map(str::to_string),
        result: result.clone(),
        created_at: parse_timestamp(&now)?,
    })
}
