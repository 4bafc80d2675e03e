//! Care-tip database operations
//!
//! Cache key = (log-text snapshot, referenced recommendation id). Reuse
//! requires exact string equality on the snapshot and identity on the
//! recommendation reference, including both being absent.

use sqlx::{Row, SqlitePool};

use crate::db::{now_timestamp, parse_timestamp};
use crate::error::{ApiError, ApiResult};
use crate::models::ai::CareTip;

fn care_tip_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<CareTip> {
    let created_at: String = row.get("created_at");
    let tips_json: String = row.get("tips_json");
    let tips = serde_json::from_str(&tips_json)
        .map_err(|e| ApiError::Internal(format!("Failed to parse stored tips: {}", e)))?;

    Ok(CareTip {
        id: row.get("id"),
        plant_id: row.get("plant_id"),
        tips,
        log_snapshot: row.get("log_snapshot"),
        recommendation_id: row.get("recommendation_id"),
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Find a reusable care tip for the exact (snapshot, recommendation) pair
///
/// `IS` instead of `=` so that a NULL recommendation reference matches a
/// NULL current recommendation.
pub async fn find_cached(
    pool: &SqlitePool,
    plant_id: i64,
    log_snapshot: &str,
    recommendation_id: Option<i64>,
) -> ApiResult<Option<CareTip>> {
    let row = sqlx::query(
        r#"
        SELECT id, plant_id, tips_json, log_snapshot, recommendation_id, created_at
        FROM care_tips
        WHERE plant_id = ? AND log_snapshot = ? AND recommendation_id IS ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(plant_id)
    .bind(log_snapshot)
    .bind(recommendation_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(care_tip_from_row).transpose()
}

/// Persist a freshly generated care tip with its cache key inputs
pub async fn insert(
    pool: &SqlitePool,
    plant_id: i64,
    tips: &serde_json::Value,
    log_snapshot: &str,
    recommendation_id: Option<i64>,
) -> ApiResult<CareTip> {
    let now = now_timestamp();
    let tips_json = tips.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO care_tips (plant_id, tips_json, log_snapshot, recommendation_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(plant_id)
    .bind(&tips_json)
    .bind(log_snapshot)
    .bind(recommendation_id)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(CareTip {
        id: result.last_insert_rowid(),
        plant_id,
        tips: tips.clone(),
        log_snapshot: log_snapshot.to_string(),
        recommendation_id,
        created_at: parse_timestamp(&now)?,
    })
}
