//! External provider clients and orchestration workflows

pub mod care_tips;
pub mod gemini;
pub mod plant_id;
pub mod recommendation;

pub use gemini::{GeminiClient, TipGenerator};
pub use plant_id::{PlantIdClient, PlantIdentifier};
