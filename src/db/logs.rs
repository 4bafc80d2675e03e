//! Care log database operations

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::db::parse_timestamp;
use crate::error::ApiResult;
use crate::models::plant::{NewPlantLog, PlantLog};

fn log_from_row(row: &sqlx::sqlite::SqliteRow) -> ApiResult<PlantLog> {
    let log_date: String = row.get("log_date");
    Ok(PlantLog {
        id: row.get("id"),
        plant_id: row.get("plant_id"),
        log_type: row.get("log_type"),
        log_value: row.get("log_value"),
        log_date: parse_timestamp(&log_date)?,
        note: row.get("note"),
    })
}

/// Insert a batch of log entries in one transaction
pub async fn insert_logs(
    pool: &SqlitePool,
    plant_id: i64,
    logs: &[NewPlantLog],
) -> ApiResult<usize> {
    let mut tx = pool.begin().await?;

    for log in logs {
        let log_date = log.log_date.unwrap_or_else(Utc::now).to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO plant_logs (plant_id, log_type, log_value, log_date, note)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(plant_id)
        .bind(&log.log_type)
        .bind(&log.log_value)
        .bind(&log_date)
        .bind(&log.note)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(logs.len())
}

/// All logs for a plant, newest first
pub async fn list_for_plant(pool: &SqlitePool, plant_id: i64) -> ApiResult<Vec<PlantLog>> {
    let rows = sqlx::query(
        r#"
        SELECT id, plant_id, log_type, log_value, log_date, note FROM plant_logs
        WHERE plant_id = ?
        ORDER BY log_date DESC, id DESC
        "#,
    )
    .bind(plant_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(log_from_row).collect()
}

/// The plant's most recent logs, newest first
pub async fn recent_logs(
    pool: &SqlitePool,
    plant_id: i64,
    limit: usize,
) -> ApiResult<Vec<PlantLog>> {
    let rows = sqlx::query(
        r#"
        SELECT id, plant_id, log_type, log_value, log_date, note FROM plant_logs
        WHERE plant_id = ?
        ORDER BY log_date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(plant_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.iter().map(log_from_row).collect()
}

/// A log entry together with the owning plant's user id
pub async fn get_with_owner(
    pool: &SqlitePool,
    log_id: i64,
) -> ApiResult<Option<(PlantLog, i64)>> {
    let row = sqlx::query(
        r#"
        SELECT l.id, l.plant_id, l.log_type, l.log_value, l.log_date, l.note,
               p.user_id AS owner_id
        FROM plant_logs l
        JOIN plants p ON p.id = l.plant_id
        WHERE l.id = ?
        "#,
    )
    .bind(log_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let owner_id: i64 = row.get("owner_id");
            Ok(Some((log_from_row(&row)?, owner_id)))
        }
        None => Ok(None),
    }
}

/// Partial update; absent fields keep their current values
pub async fn update_log(
    pool: &SqlitePool,
    log_id: i64,
    log_type: Option<&str>,
    log_value: Option<&str>,
    log_date: Option<chrono::DateTime<Utc>>,
    note: Option<&str>,
) -> ApiResult<Option<PlantLog>> {
    sqlx::query(
        r#"
        UPDATE plant_logs
        SET log_type = COALESCE(?, log_type),
            log_value = COALESCE(?, log_value),
            log_date = COALESCE(?, log_date),
            note = COALESCE(?, note)
        WHERE id = ?
        "#,
    )
    .bind(log_type)
    .bind(log_value)
    .bind(log_date.map(|dt| dt.to_rfc3339()))
    .bind(note)
    .bind(log_id)
    .execute(pool)
    .await?;

    let row = sqlx::query(
        "SELECT id, plant_id, log_type, log_value, log_date, note FROM plant_logs WHERE id = ?",
    )
    .bind(log_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(log_from_row).transpose()
}

/// Delete a single log entry
pub async fn delete_log(pool: &SqlitePool, log_id: i64) -> ApiResult<()> {
    sqlx::query("DELETE FROM plant_logs WHERE id = ?")
        .bind(log_id)
        .execute(pool)
        .await?;

    Ok(())
}
