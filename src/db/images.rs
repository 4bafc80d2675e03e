//! Plant image storage and retention
//!
//! Retention invariant: on every insert, a plant that already holds more
//! than 4 images has its oldest `count - 4` deleted first (same
//! transaction), so a plant never holds more than 5 images.

use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::db::{now_timestamp, parse_timestamp};
use crate::error::ApiResult;
use crate::models::plant::PlantImageMeta;

/// Number of existing images kept when a new one is inserted
const RETAINED_IMAGE_COUNT: i64 = 4;

/// A fetched image blob with its identity
#[derive(Debug, Clone)]
pub struct PlantImage {
    pub id: i64,
    pub plant_id: i64,
    pub data: Vec<u8>,
}

/// Insert a new image for a plant, evicting oldest excess images first
pub async fn insert_image(
    pool: &SqlitePool,
    plant_id: i64,
    data: &[u8],
) -> ApiResult<PlantImageMeta> {
    let mut tx = pool.begin().await?;
    let meta = insert_image_tx(&mut tx, plant_id, data).await?;
    tx.commit().await?;
    Ok(meta)
}

/// Transactional variant, used when image insert is part of a larger write
pub async fn insert_image_tx(
    tx: &mut Transaction<'_, Sqlite>,
    plant_id: i64,
    data: &[u8],
) -> ApiResult<PlantImageMeta> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plant_images WHERE plant_id = ?")
        .bind(plant_id)
        .fetch_one(&mut **tx)
        .await?;

    let excess = count - RETAINED_IMAGE_COUNT;
    if excess > 0 {
        sqlx::query(
            r#"
            DELETE FROM plant_images
            WHERE id IN (
                SELECT id FROM plant_images
                WHERE plant_id = ?
                ORDER BY created_at ASC, id ASC
                LIMIT ?
            )
            "#,
        )
        .bind(plant_id)
        .bind(excess)
        .execute(&mut **tx)
        .await?;

        tracing::debug!(plant_id, evicted = excess, "Evicted oldest plant images");
    }

    let now = now_timestamp();
    let result = sqlx::query(
        "INSERT INTO plant_images (plant_id, image_data, created_at) VALUES (?, ?, ?)",
    )
    .bind(plant_id)
    .bind(data)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    Ok(PlantImageMeta::new(
        result.last_insert_rowid(),
        plant_id,
        parse_timestamp(&now)?,
    ))
}

/// Fetch an image with its bytes by id
pub async fn get_image(pool: &SqlitePool, image_id: i64) -> ApiResult<Option<PlantImage>> {
    let row = sqlx::query("SELECT id, plant_id, image_data FROM plant_images WHERE id = ?")
        .bind(image_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| PlantImage {
        id: row.get("id"),
        plant_id: row.get("plant_id"),
        data: row.get("image_data"),
    }))
}

/// The plant's most recent image, with bytes
pub async fn latest_image(pool: &SqlitePool, plant_id: i64) -> ApiResult<Option<PlantImage>> {
    let row = sqlx::query(
        r#"
        SELECT id, plant_id, image_data FROM plant_images
        WHERE plant_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(plant_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| PlantImage {
        id: row.get("id"),
        plant_id: row.get("plant_id"),
        data: row.get("image_data"),
    }))
}

/// Image metadata for a plant, oldest first
pub async fn list_meta(pool: &SqlitePool, plant_id: i64) -> ApiResult<Vec<PlantImageMeta>> {
    let rows = sqlx::query(
        r#"
        SELECT id, plant_id, created_at FROM plant_images
        WHERE plant_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(plant_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let created_at: String = row.get("created_at");
            Ok(PlantImageMeta::new(
                row.get("id"),
                row.get("plant_id"),
                parse_timestamp(&created_at)?,
            ))
        })
        .collect()
}
