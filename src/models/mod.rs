//! API-facing entity types

pub mod ai;
pub mod plant;
pub mod user;

pub use ai::{CacheStatus, CareTip, Identification, Recommendation};
pub use plant::{NewPlantLog, Plant, PlantDetail, PlantImageMeta, PlantLog};
pub use user::UserProfile;
