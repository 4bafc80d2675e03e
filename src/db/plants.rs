//! Plant database operations
//!
//! Ownership is enforced here: every plant-scoped read goes through
//! `find_owned`, which scopes the query to the requesting user.

use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::db::{self, now_timestamp, parse_timestamp};
use crate::error::ApiResult;
use crate::models::plant::{Plant, PlantDetail, PlantWithImages};

fn plant_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<Plant> {
    let created_at: String = row.get("created_at");
    Ok(Plant {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        species: row.get("species"),
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Insert a plant, optionally with an initial image, in one transaction
pub async fn create_plant(
    pool: &SqlitePool,
    user_id: i64,
    name: &str,
    species: Option<&str>,
    image_data: Option<&[u8]>,
) -> ApiResult<PlantWithImages> {
    let mut tx = pool.begin().await?;

    let now = now_timestamp();
    let result = sqlx::query(
        "INSERT INTO plants (user_id, name, species, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(name)
    .bind(species)
    .bind(&now)
    .execute(&mut *tx)
    .await?;
    let plant_id = result.last_insert_rowid();

    let mut images = Vec::new();
    if let Some(data) = image_data {
        images.push(db::images::insert_image_tx(&mut tx, plant_id, data).await?);
    }

    tx.commit().await?;

    Ok(PlantWithImages {
        plant: Plant {
            id: plant_id,
            user_id,
            name: name.to_string(),
            species: species.map(str::to_string),
            created_at: parse_timestamp(&now)?,
        },
        images,
    })
}

/// Load a plant only if it belongs to the given user
pub async fn find_owned(
    pool: &SqlitePool,
    plant_id: i64,
    user_id: i64,
) -> ApiResult<Option<Plant>> {
    let row = sqlx::query(
        "SELECT id, user_id, name, species, created_at FROM plants WHERE id = ? AND user_id = ?",
    )
    .bind(plant_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| plant_from_row(&row)).transpose()
}

/// All of a user's plants, newest first, with image metadata
pub async fn list_plants(pool: &SqlitePool, user_id: i64) -> ApiResult<Vec<PlantWithImages>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, name, species, created_at FROM plants
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let plant = plant_from_row(&row)?;
        let images = db::images::list_meta(pool, plant.id).await?;
        result.push(PlantWithImages { plant, images });
    }

    Ok(result)
}

/// A plant with its images, logs and recommendations
pub async fn get_detail(
    pool: &SqlitePool,
    plant_id: i64,
    user_id: i64,
) -> ApiResult<Option<PlantDetail>> {
    let Some(plant) = find_owned(pool, plant_id, user_id).await? else {
        return Ok(None);
    };

    let images = db::images::list_meta(pool, plant_id).await?;
    let logs = db::logs::list_for_plant(pool, plant_id).await?;
    let recommendations = db::recommendations::list_for_plant(pool, plant_id).await?;

    Ok(Some(PlantDetail {
        plant,
        images,
        logs,
        recommendations,
    }))
}

/// Update name and/or species
pub async fn update_plant(
    pool: &SqlitePool,
    plant_id: i64,
    name: Option<&str>,
    species: Option<&str>,
) -> ApiResult<()> {
    sqlx::query(
        r#"
        UPDATE plants
        SET name = COALESCE(?, name),
            species = COALESCE(?, species)
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(species)
    .bind(plant_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a plant and all of its children in one transaction
pub async fn delete_plant(pool: &SqlitePool, plant_id: i64) -> ApiResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM care_tips WHERE plant_id = ?")
        .bind(plant_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM ai_recommendations WHERE plant_id = ?")
        .bind(plant_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM plant_logs WHERE plant_id = ?")
        .bind(plant_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM plant_images WHERE plant_id = ?")
        .bind(plant_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM plants WHERE id = ?")
        .bind(plant_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// One-way species auto-fill: only writes when the current value is
/// NULL, empty, or whitespace
pub async fn set_species_if_empty_tx(
    tx: &mut Transaction<'_, Sqlite>,
    plant_id: i64,
    species: &str,
) -> ApiResult<bool> {
    let result = sqlx::query(
        "UPDATE plants SET species = ? WHERE id = ? AND (species IS NULL OR TRIM(species) = '')",
    )
    .bind(species)
    .bind(plant_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}
