//! Recommendation orchestration and cache policy
//!
//! A stored recommendation is reusable when it references the plant's
//! current latest image and the caller did not request a bypass. Otherwise
//! the latest image is sent to the identification provider and the result
//! persisted as a new row. Two concurrent regenerations may both reach the
//! provider and both insert; the latest row wins for subsequent reads.

use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::ai::{CacheStatus, Recommendation};
use crate::models::plant::Plant;
use crate::services::plant_id::PlantIdentifier;

/// Result of the recommendation workflow
#[derive(Debug)]
pub struct RecommendationOutcome {
    pub status: CacheStatus,
    pub recommendation: Recommendation,
}

/// Return a cached recommendation for the plant's latest image, or call
/// the identification provider and persist a fresh one
pub async fn get_or_generate(
    pool: &SqlitePool,
    identifier: &dyn PlantIdentifier,
    plant: &Plant,
    force: bool,
) -> ApiResult<RecommendationOutcome> {
    let image = db::images::latest_image(pool, plant.id)
        .await?
        .ok_or(ApiError::NoImageAvailable)?;

    if !force {
        if let Some(cached) = db::recommendations::find_for_image(pool, image.id).await? {
            info!(plant_id = plant.id, image_id = image.id, "Reusing stored recommendation");
            return Ok(RecommendationOutcome {
                status: CacheStatus::Cached,
                recommendation: cached,
            });
        }
    }

    let identification = identifier.identify(&image.data).await?;

    let diseases = if identification.disease_names.is_empty() {
        None
    } else {
        Some(identification.disease_names.join(", "))
    };
    let result = serde_json::to_value(&identification)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize identification: {}", e)))?;

    // Recommendation insert and the conditional species fill are one
    // atomic write
    let mut tx = pool.begin().await?;
    let recommendation = db::recommendations::insert_tx(
        &mut tx,
        plant.id,
        image.id,
        Some(&identification.species_name),
        diseases.as_deref(),
        &result,
    )
    .await?;
    let species_filled =
        db::plants::set_species_if_empty_tx(&mut tx, plant.id, &identification.species_name)
            .await?;
    tx.commit().await?;

    if species_filled {
        info!(
            plant_id = plant.id,
            species = %identification.species_name,
            "Species auto-filled from identification"
        );
    }

    info!(plant_id = plant.id, image_id = image.id, "Stored new recommendation");

    Ok(RecommendationOutcome {
        status: CacheStatus::New,
        recommendation,
    })
}
