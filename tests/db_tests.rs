//! Database-level tests: image retention, ownership scoping, log storage

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use leafling::db;
use leafling::error::ApiError;
use leafling::models::plant::NewPlantLog;

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    db::init_tables(&pool).await.unwrap();
    pool
}

async fn seed_user(pool: &SqlitePool, email: &str) -> i64 {
    db::users::create_user(pool, "Tester", email, "hash")
        .await
        .unwrap()
        .id
}

// ============================================================================
// Image retention
// ============================================================================

#[tokio::test]
async fn test_fifth_image_inserts_without_eviction() {
    let pool = memory_pool().await;
    let user_id = seed_user(&pool, "a@example.com").await;
    let plant = db::plants::create_plant(&pool, user_id, "Freddy", None, None)
        .await
        .unwrap()
        .plant;

    for i in 0..5u8 {
        db::images::insert_image(&pool, plant.id, &[i]).await.unwrap();
    }

    let images = db::images::list_meta(&pool, plant.id).await.unwrap();
    assert_eq!(images.len(), 5);
}

#[tokio::test]
async fn test_sixth_image_evicts_the_oldest() {
    let pool = memory_pool().await;
    let user_id = seed_user(&pool, "a@example.com").await;
    let plant = db::plants::create_plant(&pool, user_id, "Freddy", None, None)
        .await
        .unwrap()
        .plant;

    let mut inserted_ids = Vec::new();
    for i in 0..6u8 {
        let meta = db::images::insert_image(&pool, plant.id, &[i]).await.unwrap();
        inserted_ids.push(meta.id);
    }

    let images = db::images::list_meta(&pool, plant.id).await.unwrap();
    let remaining: Vec<i64> = images.iter().map(|m| m.id).collect();

    assert_eq!(images.len(), 5, "retention caps a plant at 5 images");
    assert_eq!(remaining, inserted_ids[1..].to_vec(), "exactly the oldest is deleted");
}

#[tokio::test]
async fn test_retention_only_touches_the_owning_plant() {
    let pool = memory_pool().await;
    let user_id = seed_user(&pool, "a@example.com").await;
    let first = db::plants::create_plant(&pool, user_id, "Freddy", None, None)
        .await
        .unwrap()
        .plant;
    let second = db::plants::create_plant(&pool, user_id, "Benny", None, None)
        .await
        .unwrap()
        .plant;

    db::images::insert_image(&pool, second.id, b"other").await.unwrap();
    for i in 0..6u8 {
        db::images::insert_image(&pool, first.id, &[i]).await.unwrap();
    }

    assert_eq!(db::images::list_meta(&pool, first.id).await.unwrap().len(), 5);
    assert_eq!(db::images::list_meta(&pool, second.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_latest_image_is_the_most_recent_insert() {
    let pool = memory_pool().await;
    let user_id = seed_user(&pool, "a@example.com").await;
    let plant = db::plants::create_plant(&pool, user_id, "Freddy", None, None)
        .await
        .unwrap()
        .plant;

    db::images::insert_image(&pool, plant.id, b"old").await.unwrap();
    let newest = db::images::insert_image(&pool, plant.id, b"new").await.unwrap();

    let latest = db::images::latest_image(&pool, plant.id).await.unwrap().unwrap();
    assert_eq!(latest.id, newest.id);
    assert_eq!(latest.data, b"new");
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_duplicate_email_is_a_conflict() {
    let pool = memory_pool().await;
    seed_user(&pool, "same@example.com").await;

    let err = db::users::create_user(&pool, "Other", "same@example.com", "hash")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn test_update_profile_rejects_taken_email() {
    let pool = memory_pool().await;
    let first = seed_user(&pool, "first@example.com").await;
    seed_user(&pool, "second@example.com").await;

    let err = db::users::update_profile(&pool, first, None, Some("second@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn test_profile_reports_image_presence() {
    let pool = memory_pool().await;
    let user_id = seed_user(&pool, "a@example.com").await;

    let before = db::users::get_profile(&pool, user_id).await.unwrap().unwrap();
    assert!(!before.has_profile_image);
    assert!(before.profile_image_url.is_none());

    db::users::set_profile_image(&pool, user_id, b"avatar").await.unwrap();

    let after = db::users::get_profile(&pool, user_id).await.unwrap().unwrap();
    assert!(after.has_profile_image);
    assert_eq!(
        after.profile_image_url.as_deref(),
        Some(format!("/users/profile-image/{}", user_id).as_str())
    );
}

// ============================================================================
// Plants and ownership
// ============================================================================

#[tokio::test]
async fn test_find_owned_scopes_to_user() {
    let pool = memory_pool().await;
    let owner = seed_user(&pool, "owner@example.com").await;
    let stranger = seed_user(&pool, "stranger@example.com").await;
    let plant = db::plants::create_plant(&pool, owner, "Freddy", None, None)
        .await
        .unwrap()
        .plant;

    assert!(db::plants::find_owned(&pool, plant.id, owner).await.unwrap().is_some());
    assert!(db::plants::find_owned(&pool, plant.id, stranger).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_plant_removes_children() {
    let pool = memory_pool().await;
    let owner = seed_user(&pool, "owner@example.com").await;
    let plant = db::plants::create_plant(&pool, owner, "Freddy", None, Some(b"photo"))
        .await
        .unwrap()
        .plant;
    let logs = vec![NewPlantLog {
        log_type: "watering".to_string(),
        log_value: None,
        log_date: None,
        note: None,
    }];
    db::logs::insert_logs(&pool, plant.id, &logs).await.unwrap();

    db::plants::delete_plant(&pool, plant.id).await.unwrap();

    assert!(db::plants::find_owned(&pool, plant.id, owner).await.unwrap().is_none());
    assert!(db::images::list_meta(&pool, plant.id).await.unwrap().is_empty());
    assert!(db::logs::list_for_plant(&pool, plant.id).await.unwrap().is_empty());
}

// ============================================================================
// Logs
// ============================================================================

#[tokio::test]
async fn test_recent_logs_returns_newest_first_with_limit() {
    let pool = memory_pool().await;
    let owner = seed_user(&pool, "owner@example.com").await;
    let plant = db::plants::create_plant(&pool, owner, "Freddy", None, None)
        .await
        .unwrap()
        .plant;

    let logs: Vec<NewPlantLog> = (0..7)
        .map(|i| NewPlantLog {
            log_type: format!("event-{}", i),
            log_value: None,
            log_date: Some(
                format!("2026-08-0{}T10:00:00Z", i + 1)
                    .parse()
                    .unwrap(),
            ),
            note: None,
        })
        .collect();
    db::logs::insert_logs(&pool, plant.id, &logs).await.unwrap();

    let recent = db::logs::recent_logs(&pool, plant.id, 5).await.unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0].log_type, "event-6");
    assert_eq!(recent[4].log_type, "event-2");
}

#[tokio::test]
async fn test_get_with_owner_exposes_parent_user() {
    let pool = memory_pool().await;
    let owner = seed_user(&pool, "owner@example.com").await;
    let plant = db::plants::create_plant(&pool, owner, "Freddy", None, None)
        .await
        .unwrap()
        .plant;
    let logs = vec![NewPlantLog {
        log_type: "watering".to_string(),
        log_value: None,
        log_date: None,
        note: None,
    }];
    db::logs::insert_logs(&pool, plant.id, &logs).await.unwrap();
    let stored = db::logs::list_for_plant(&pool, plant.id).await.unwrap();

    let (log, owner_id) = db::logs::get_with_owner(&pool, stored[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(log.log_type, "watering");
    assert_eq!(owner_id, owner);
}
