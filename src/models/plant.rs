//! Plant, image and care-log types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ai::Recommendation;

/// A tracked plant, owned by exactly one user
#[derive(Debug, Clone, Serialize)]
pub struct Plant {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Auto-filled by identification when empty (one-way)
    pub species: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Image metadata; raw bytes are served via `GET /images/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct PlantImageMeta {
    pub id: i64,
    pub plant_id: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl PlantImageMeta {
    pub fn new(id: i64, plant_id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            plant_id,
            url: format!("/images/{}", id),
            created_at,
        }
    }
}

/// A care log entry (watering, fertilizing, repotting, ...)
#[derive(Debug, Clone, Serialize)]
pub struct PlantLog {
    pub id: i64,
    pub plant_id: i64,
    pub log_type: String,
    pub log_value: Option<String>,
    pub log_date: DateTime<Utc>,
    pub note: Option<String>,
}

/// Incoming log entry; `log_date` defaults to now when unspecified
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlantLog {
    pub log_type: String,
    pub log_value: Option<String>,
    pub log_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// A plant with its related collections, as returned by `GET /plants/{id}`
#[derive(Debug, Serialize)]
pub struct PlantDetail {
    #[serde(flatten)]
    pub plant: Plant,
    pub images: Vec<PlantImageMeta>,
    pub logs: Vec<PlantLog>,
    pub recommendations: Vec<Recommendation>,
}

/// A plant with image metadata, as returned by the list endpoint
#[derive(Debug, Serialize)]
pub struct PlantWithImages {
    #[serde(flatten)]
    pub plant: Plant,
    pub images: Vec<PlantImageMeta>,
}
