//! User profile types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// User profile without the raw profile image bytes
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Whether a profile image blob is stored for this user
    pub has_profile_image: bool,
    /// Retrieval URL for the profile image, if one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Internal row used for credential verification
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Public user summary returned by auth endpoints
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}
