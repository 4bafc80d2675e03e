//! AI recommendation and care-tip types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized output of the identification provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identification {
    /// Top classification suggestion, or "Unknown" when the provider
    /// returned an empty suggestion list
    pub species_name: String,
    /// Disease suggestions at or above the probability threshold,
    /// provider order preserved
    pub disease_names: Vec<String>,
    /// All symptom suggestion names, unfiltered
    pub symptom_names: Vec<String>,
}

/// A stored identification result, keyed by the image it was computed from
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub id: i64,
    pub plant_id: i64,
    /// The image this result was computed from; cache identity key
    pub image_id: i64,
    pub species: Option<String>,
    /// Comma-joined disease names, absent when none passed the filter
    pub diseases: Option<String>,
    /// Full normalized provider result
    pub result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A stored care-tip result with its cache key inputs
#[derive(Debug, Clone, Serialize)]
pub struct CareTip {
    pub id: i64,
    pub plant_id: i64,
    /// Structured tips object (water/sunlight/soil/general/warnings)
    pub tips: serde_json::Value,
    /// Rendered log text this result was generated from
    pub log_snapshot: String,
    /// Recommendation in effect at generation time, if any
    pub recommendation_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Whether an orchestration result was served from storage or regenerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Cached,
    New,
}
