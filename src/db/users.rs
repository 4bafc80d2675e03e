//! User database operations

use sqlx::{Row, SqlitePool};

use crate::db::{now_timestamp, parse_timestamp};
use crate::error::{ApiError, ApiResult};
use crate::models::user::{UserCredentials, UserProfile, UserSummary};

/// Insert a new user; duplicate email maps to `Conflict`
pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> ApiResult<UserSummary> {
    let now = now_timestamp();

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::Conflict("Email already exists".to_string())
        }
        _ => ApiError::Database(e),
    })?;

    Ok(UserSummary {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        email: email.to_string(),
    })
}

/// Look up credentials by email for login
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> ApiResult<Option<UserCredentials>> {
    let row = sqlx::query(
        "SELECT id, name, email, password_hash FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| UserCredentials {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }))
}

/// Load a profile without the image bytes
pub async fn get_profile(pool: &SqlitePool, user_id: i64) -> ApiResult<Option<UserProfile>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, email, created_at, updated_at,
               profile_image IS NOT NULL AS has_image
        FROM users WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let id: i64 = row.get("id");
            let has_image: bool = row.get("has_image");
            let created_at: String = row.get("created_at");
            let updated_at: String = row.get("updated_at");

            Ok(Some(UserProfile {
                id,
                name: row.get("name"),
                email: row.get("email"),
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
                has_profile_image: has_image,
                profile_image_url: has_image.then(|| format!("/users/profile-image/{}", id)),
            }))
        }
        None => Ok(None),
    }
}

/// Update name and/or email; an email taken by another user maps to `Conflict`
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    name: Option<&str>,
    email: Option<&str>,
) -> ApiResult<Option<UserProfile>> {
    if let Some(email) = email {
        let taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? AND id != ?",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        if taken > 0 {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }
    }

    sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE(?, name),
            email = COALESCE(?, email),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(now_timestamp())
    .bind(user_id)
    .execute(pool)
    .await?;

    get_profile(pool, user_id).await
}

/// Store the profile image blob
pub async fn set_profile_image(pool: &SqlitePool, user_id: i64, image: &[u8]) -> ApiResult<()> {
    sqlx::query("UPDATE users SET profile_image = ?, updated_at = ? WHERE id = ?")
        .bind(image)
        .bind(now_timestamp())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Fetch the raw profile image bytes, if stored
pub async fn get_profile_image(pool: &SqlitePool, user_id: i64) -> ApiResult<Option<Vec<u8>>> {
    let row = sqlx::query("SELECT profile_image FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|row| row.get::<Option<Vec<u8>>, _>("profile_image")))
}

/// Clear the profile image blob
pub async fn clear_profile_image(pool: &SqlitePool, user_id: i64) -> ApiResult<()> {
    sqlx::query("UPDATE users SET profile_image = NULL, updated_at = ? WHERE id = ?")
        .bind(now_timestamp())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// List all users (name and email only)
pub async fn list_users(pool: &SqlitePool) -> ApiResult<Vec<UserSummary>> {
    let rows = sqlx::query("SELECT id, name, email FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| UserSummary {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
        })
        .collect())
}
