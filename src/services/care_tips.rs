//! Care-tip orchestration and cache policy
//!
//! The cache key is the pair (rendered log text, latest recommendation
//! id). A stored tip is reused only when both match exactly; any change to
//! the recent log set or to which recommendation is latest regenerates.

use sqlx::SqlitePool;
use tracing::info;

use crate::db;
use crate::error::ApiResult;
use crate::models::ai::{CacheStatus, CareTip};
use crate::models::plant::{Plant, PlantLog};
use crate::services::gemini::TipGenerator;

/// How many of the most recent logs feed the snapshot
pub const RECENT_LOG_COUNT: usize = 5;

/// Snapshot text for a plant with no logs at all
pub const NO_LOGS_SNAPSHOT: &str = "No specific care logs recorded yet.";

/// Result of the care-tip workflow
#[derive(Debug)]
pub struct CareTipsOutcome {
    pub status: CacheStatus,
    pub care_tip: CareTip,
}

/// Render the log-text snapshot: one line per log, newest first
///
/// The exact string doubles as the cache key, so formatting changes here
/// invalidate every stored tip.
pub fn render_log_text(logs: &[PlantLog]) -> String {
    if logs.is_empty() {
        return NO_LOGS_SNAPSHOT.to_string();
    }

    logs.iter()
        .map(|log| {
            let mut line = format!("[{}] {}", log.log_date.format("%Y-%m-%d"), log.log_type);
            if let Some(value) = log.log_value.as_deref().filter(|v| !v.is_empty()) {
                line.push_str(": ");
                line.push_str(value);
            }
            if let Some(note) = log.note.as_deref().filter(|n| !n.is_empty()) {
                line.push_str(&format!(" ({})", note));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Return a cached care tip for the current (logs, recommendation) state,
/// or call the text-generation provider and persist a fresh one
pub async fn get_or_generate(
    pool: &SqlitePool,
    generator: &dyn TipGenerator,
    plant: &Plant,
) -> ApiResult<CareTipsOutcome> {
    let logs = db::logs::recent_logs(pool, plant.id, RECENT_LOG_COUNT).await?;
    let snapshot = render_log_text(&logs);
    let latest = db::recommendations::latest_for_plant(pool, plant.id).await?;
    let recommendation_id = latest.as_ref().map(|r| r.id);

    if let Some(cached) =
        db::care_tips::find_cached(pool, plant.id, &snapshot, recommendation_id).await?
    {
        info!(plant_id = plant.id, "Reusing stored care tips");
        return Ok(CareTipsOutcome {
            status: CacheStatus::Cached,
            care_tip: cached,
        });
    }

    let disease_summary = latest.as_ref().and_then(|r| r.diseases.as_deref());
    let log_text = if logs.is_empty() {
        None
    } else {
        Some(snapshot.as_str())
    };

    let tips = generator
        .generate_tips(&plant.name, disease_summary, log_text)
        .await?;

    let care_tip =
        db::care_tips::insert(pool, plant.id, &tips, &snapshot, recommendation_id).await?;

    info!(plant_id = plant.id, "Stored new care tips");

    Ok(CareTipsOutcome {
        status: CacheStatus::New,
        care_tip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn log(id: i64, date: &str, log_type: &str, value: Option<&str>, note: Option<&str>) -> PlantLog {
        PlantLog {
            id,
            plant_id: 1,
            log_type: log_type.to_string(),
            log_value: value.map(str::to_string),
            log_date: format!("{}T12:00:00Z", date)
                .parse::<DateTime<Utc>>()
                .unwrap(),
            note: note.map(str::to_string),
        }
    }

    #[test]
    fn test_zero_logs_renders_literal() {
        assert_eq!(render_log_text(&[]), NO_LOGS_SNAPSHOT);
    }

    #[test]
    fn test_render_one_line_per_log() {
        let logs = vec![
            log(2, "2026-08-05", "watering", Some("200ml"), None),
            log(1, "2026-08-01", "fertilizing", None, Some("slow release")),
        ];
        assert_eq!(
            render_log_text(&logs),
            "[2026-08-05] watering: 200ml\n[2026-08-01] fertilizing (slow release)"
        );
    }

    #[test]
    fn test_render_skips_empty_optional_fields() {
        let logs = vec![log(1, "2026-08-05", "repotting", Some(""), Some(""))];
        assert_eq!(render_log_text(&logs), "[2026-08-05] repotting");
    }

    #[test]
    fn test_any_field_change_alters_snapshot() {
        let original = vec![log(1, "2026-08-05", "watering", Some("200ml"), None)];
        let edited = vec![log(1, "2026-08-05", "watering", Some("250ml"), None)];
        assert_ne!(render_log_text(&original), render_log_text(&edited));
    }
}
