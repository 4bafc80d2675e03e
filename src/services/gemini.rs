//! Gemini care-tip generation client
//!
//! Renders a fixed prompt from plant name, disease summary and recent log
//! text, invokes the text-generation provider, and validates the returned
//! text as JSON. Malformed provider output never fails the call: the
//! cleaned text is wrapped in a fallback object instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Gemini generateContent endpoint for the model in use
const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

/// Timeout for generation requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Disease summary used when identification found nothing actionable
const DEFAULT_DISEASE_INFO: &str = "No specific diseases detected, but general care is needed.";

/// Log text used when the owner recorded no care activity
const DEFAULT_CARE_LOGS: &str = "No specific care logs provided.";

/// Warning attached to the fallback object when the provider output did
/// not parse as JSON
const FALLBACK_WARNING: &str = "Could not parse specific categories.";

/// Seam for the text-generation provider
#[async_trait]
pub trait TipGenerator: Send + Sync {
    /// Generate a structured tips object for a plant.
    ///
    /// `disease_summary` and `log_text` fall back to fixed phrases when
    /// absent. The returned value is always a JSON object; unparseable
    /// provider output degrades to a fallback object rather than an error.
    async fn generate_tips(
        &self,
        plant_name: &str,
        disease_summary: Option<&str>,
        log_text: Option<&str>,
    ) -> ApiResult<Value>;
}

/// HTTP client for the Gemini text-generation API
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            api_key,
        }
    }

    async fn invoke(&self, prompt: &str) -> ApiResult<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .http_client
            .post(GEMINI_API_URL)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Provider(format!("Care tip generation failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "Text generation provider returned {}: {}",
                status, body
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            ApiError::Provider(format!("Failed to parse generation response: {}", e))
        })?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                ApiError::Provider("Generation response contained no candidates".to_string())
            })
    }
}

#[async_trait]
impl TipGenerator for GeminiClient {
    async fn generate_tips(
        &self,
        plant_name: &str,
        disease_summary: Option<&str>,
        log_text: Option<&str>,
    ) -> ApiResult<Value> {
        let prompt = build_prompt(plant_name, disease_summary, log_text);
        debug!(plant_name, prompt_chars = prompt.len(), "Requesting care tips");

        let raw = self.invoke(&prompt).await?;
        Ok(parse_or_fallback(&raw))
    }
}

/// Render the fixed prompt template
pub fn build_prompt(
    plant_name: &str,
    disease_summary: Option<&str>,
    log_text: Option<&str>,
) -> String {
    let disease_info = disease_summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_DISEASE_INFO);
    let care_logs = log_text
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_CARE_LOGS);

    format!(
        r#"You are an expert botanist and plant pathologist.

I have a plant named "{plant_name}".
It has been identified to potentially have the following issues: {disease_info}.

Here are the care logs provided by the owner:
{care_logs}

Based on this information, please provide a concise but comprehensive set of care tips to help this plant recover and thrive.
Focus on actionable advice.
If the logs suggest improper care (e.g., overwatering), kindly point that out and suggest a correction.
If the disease info is serious, suggest immediate treatment steps.

IMPORTANT: Return the response in valid JSON format with the following structure:
{{
  "water": "Advice on watering...",
  "sunlight": "Advice on light exposure...",
  "soil": "Advice on soil and fertilizer...",
  "general": "General care advice...",
  "warnings": "Specific warnings based on disease or bad practices..."
}}
Do not include markdown formatting like ```json. Just return the raw JSON."#
    )
}

/// Remove markdown code-fence wrapping from raw provider output
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse cleaned provider output as JSON, degrading to a fallback object
/// on failure
pub fn parse_or_fallback(raw: &str) -> Value {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Provider output did not parse as JSON: {}", e);
            json!({
                "general": cleaned,
                "warnings": FALLBACK_WARNING,
            })
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_inputs() {
        let prompt = build_prompt("Freddy", Some("leaf spot, rust"), Some("[2026-08-01] watering"));
        assert!(prompt.contains("a plant named \"Freddy\""));
        assert!(prompt.contains("leaf spot, rust"));
        assert!(prompt.contains("[2026-08-01] watering"));
    }

    #[test]
    fn test_prompt_defaults_for_missing_inputs() {
        let prompt = build_prompt("Freddy", None, None);
        assert!(prompt.contains(DEFAULT_DISEASE_INFO));
        assert!(prompt.contains(DEFAULT_CARE_LOGS));
    }

    #[test]
    fn test_prompt_defaults_for_blank_inputs() {
        let prompt = build_prompt("Freddy", Some("   "), Some(""));
        assert!(prompt.contains(DEFAULT_DISEASE_INFO));
        assert!(prompt.contains(DEFAULT_CARE_LOGS));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```json\n{\"water\": \"daily\"}\n```"),
            "{\"water\": \"daily\"}"
        );
        assert_eq!(strip_code_fences("no fences"), "no fences");
    }

    #[test]
    fn test_valid_json_passes_through() {
        let tips = parse_or_fallback("```json\n{\"water\": \"weekly\", \"warnings\": \"none\"}\n```");
        assert_eq!(tips["water"], "weekly");
        assert_eq!(tips["warnings"], "none");
    }

    #[test]
    fn test_malformed_output_degrades_to_fallback() {
        let tips = parse_or_fallback("```\nWater it twice a week and keep it in shade.\n```");
        assert_eq!(tips["general"], "Water it twice a week and keep it in shade.");
        assert_eq!(tips["warnings"], FALLBACK_WARNING);
    }
}
