//! Plant.id identification client
//!
//! Sends an image to the identification provider and normalizes the
//! response into an [`Identification`]: top classification suggestion,
//! disease suggestions above the probability threshold, and all symptom
//! names. Rejects images the provider considers unlikely to be a plant.
//!
//! # API Reference
//! - Endpoint: https://plant.id/api/v3/identification
//! - Response paths: `result.is_plant.probability`,
//!   `result.classification.suggestions[].name`,
//!   `result.disease.suggestions[].name/probability`,
//!   `result.symptom.suggestions[].name`

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::models::ai::Identification;

/// Plant.id API endpoint
const PLANT_ID_API_URL: &str = "https://plant.id/api/v3/identification";

/// Timeout for identification requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum `is_plant` probability; below this the image is rejected
pub const MIN_PLANT_PROBABILITY: f64 = 0.7;

/// Minimum probability for a disease suggestion to be kept
pub const MIN_DISEASE_PROBABILITY: f64 = 0.6;

/// Species name used when the provider returns no classification suggestions
const UNKNOWN_SPECIES: &str = "Unknown";

/// Seam for the identification provider, so orchestration is testable
/// without the network
#[async_trait]
pub trait PlantIdentifier: Send + Sync {
    /// Identify the plant on an image, or fail with a typed error
    async fn identify(&self, image: &[u8]) -> ApiResult<Identification>;
}

/// HTTP client for the Plant.id identification API
pub struct PlantIdClient {
    http_client: Client,
    api_key: String,
}

impl PlantIdClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl PlantIdentifier for PlantIdClient {
    async fn identify(&self, image: &[u8]) -> ApiResult<Identification> {
        let payload = IdentifyRequest {
            images: vec![BASE64.encode(image)],
            symptoms: true,
            classification_level: "all",
            health: "all",
        };

        debug!(image_bytes = image.len(), "Querying identification provider");

        let response = self
            .http_client
            .post(PLANT_ID_API_URL)
            .header("Api-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiError::Provider(format!("Identification request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::QuotaExceeded(
                "Plant identification service quota exceeded. Please try again later or upgrade your plan."
                    .to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "Identification provider returned {}: {}",
                status, body
            )));
        }

        let body: IdentifyResponse = response.json().await.map_err(|e| {
            ApiError::Provider(format!("Failed to parse identification response: {}", e))
        })?;

        normalize_response(body)
    }
}

/// Apply the plant-confidence gate and shape the provider response
fn normalize_response(body: IdentifyResponse) -> ApiResult<Identification> {
    let result = body
        .result
        .ok_or_else(|| ApiError::Provider("Identification response missing result".to_string()))?;

    if let Some(is_plant) = &result.is_plant {
        debug!(probability = is_plant.probability, "Plant detection");
        if is_plant.probability < MIN_PLANT_PROBABILITY {
            return Err(ApiError::NotAPlant(format!(
                "The image does not appear to be a plant (Confidence: {:.1}%). Please upload a clear photo of a plant.",
                is_plant.probability * 100.0
            )));
        }
    } else {
        debug!("is_plant data missing from response");
    }

    let classification = result.classification.ok_or_else(|| {
        ApiError::Provider("Identification response missing classification".to_string())
    })?;
    let species_name = classification
        .suggestions
        .first()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| UNKNOWN_SPECIES.to_string());

    let disease_names = result
        .disease
        .map(|d| {
            d.suggestions
                .into_iter()
                .filter(|s| s.probability >= MIN_DISEASE_PROBABILITY)
                .map(|s| s.name)
                .collect()
        })
        .unwrap_or_default();

    let symptom = result.symptom.ok_or_else(|| {
        ApiError::Provider("Identification response missing symptom data".to_string())
    })?;
    let symptom_names = symptom.suggestions.into_iter().map(|s| s.name).collect();

    Ok(Identification {
        species_name,
        disease_names,
        symptom_names,
    })
}

// ============================================================================
// Plant.id API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct IdentifyRequest {
    images: Vec<String>,
    symptoms: bool,
    classification_level: &'static str,
    health: &'static str,
}

#[derive(Debug, Deserialize)]
struct IdentifyResponse {
    result: Option<IdentifyResult>,
}

#[derive(Debug, Deserialize)]
struct IdentifyResult {
    is_plant: Option<IsPlant>,
    classification: Option<SuggestionList>,
    disease: Option<ScoredSuggestionList>,
    symptom: Option<SuggestionList>,
}

#[derive(Debug, Deserialize)]
struct IsPlant {
    probability: f64,
}

#[derive(Debug, Deserialize)]
struct SuggestionList {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ScoredSuggestionList {
    #[serde(default)]
    suggestions: Vec<ScoredSuggestion>,
}

#[derive(Debug, Deserialize)]
struct ScoredSuggestion {
    name: String,
    probability: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> IdentifyResponse {
        serde_json::from_value(value).unwrap()
    }

    fn full_response(is_plant: f64) -> serde_json::Value {
        json!({
            "result": {
                "is_plant": { "probability": is_plant },
                "classification": {
                    "suggestions": [
                        { "name": "Monstera deliciosa" },
                        { "name": "Monstera adansonii" }
                    ]
                },
                "disease": {
                    "suggestions": [
                        { "name": "leaf spot", "probability": 0.82 },
                        { "name": "nutrient deficiency", "probability": 0.6 },
                        { "name": "sunburn", "probability": 0.59 }
                    ]
                },
                "symptom": {
                    "suggestions": [
                        { "name": "yellowing" },
                        { "name": "brown edges" }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_low_plant_probability_rejected() {
        let err = normalize_response(parse(full_response(0.65))).unwrap_err();
        match err {
            ApiError::NotAPlant(msg) => {
                assert!(msg.contains("65.0%"), "message should embed percentage: {}", msg);
            }
            other => panic!("expected NotAPlant, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_probability_accepted() {
        let id = normalize_response(parse(full_response(0.7))).unwrap();
        assert_eq!(id.species_name, "Monstera deliciosa");
    }

    #[test]
    fn test_disease_filter_keeps_threshold_and_order() {
        let id = normalize_response(parse(full_response(0.95))).unwrap();
        assert_eq!(id.disease_names, vec!["leaf spot", "nutrient deficiency"]);
    }

    #[test]
    fn test_symptoms_collected_unfiltered() {
        let id = normalize_response(parse(full_response(0.95))).unwrap();
        assert_eq!(id.symptom_names, vec!["yellowing", "brown edges"]);
    }

    #[test]
    fn test_missing_is_plant_proceeds() {
        let id = normalize_response(parse(json!({
            "result": {
                "classification": { "suggestions": [{ "name": "Ficus lyrata" }] },
                "symptom": { "suggestions": [] }
            }
        })))
        .unwrap();
        assert_eq!(id.species_name, "Ficus lyrata");
        assert!(id.disease_names.is_empty());
    }

    #[test]
    fn test_empty_suggestions_fall_back_to_unknown() {
        let id = normalize_response(parse(json!({
            "result": {
                "is_plant": { "probability": 0.99 },
                "classification": { "suggestions": [] },
                "symptom": { "suggestions": [] }
            }
        })))
        .unwrap();
        assert_eq!(id.species_name, "Unknown");
    }

    #[test]
    fn test_missing_classification_is_provider_error() {
        let err = normalize_response(parse(json!({
            "result": {
                "is_plant": { "probability": 0.9 },
                "symptom": { "suggestions": [] }
            }
        })))
        .unwrap_err();
        assert!(matches!(err, ApiError::Provider(_)));
    }

    #[test]
    fn test_missing_result_is_provider_error() {
        let err = normalize_response(parse(json!({}))).unwrap_err();
        assert!(matches!(err, ApiError::Provider(_)));
    }
}
