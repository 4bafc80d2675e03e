//! HTTP-level integration tests
//!
//! Drives the full router with tower one-shot requests against an
//! in-memory database and stubbed providers.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use leafling::config::Config;
use leafling::error::ApiResult;
use leafling::models::ai::Identification;
use leafling::services::gemini::TipGenerator;
use leafling::services::plant_id::PlantIdentifier;
use leafling::AppState;

struct StubIdentifier;

#[async_trait]
impl PlantIdentifier for StubIdentifier {
    async fn identify(&self, _image: &[u8]) -> ApiResult<Identification> {
        Ok(Identification {
            species_name: "Monstera deliciosa".to_string(),
            disease_names: vec!["leaf spot".to_string()],
            symptom_names: vec![],
        })
    }
}

struct StubGenerator;

#[async_trait]
impl TipGenerator for StubGenerator {
    async fn generate_tips(
        &self,
        _plant_name: &str,
        _disease_summary: Option<&str>,
        _log_text: Option<&str>,
    ) -> ApiResult<Value> {
        Ok(json!({ "general": "keep it simple", "warnings": "none" }))
    }
}

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: PathBuf::from(":memory:"),
        jwt_secret: "test-secret".to_string(),
        token_ttl_minutes: 60,
        plant_id_api_key: "test-key".to_string(),
        gemini_api_key: "test-key".to_string(),
    }
}

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    leafling::db::init_tables(&pool).await.unwrap();

    let state = AppState::new(
        pool,
        test_config(),
        Arc::new(StubIdentifier),
        Arc::new(StubGenerator),
    );
    leafling::build_router(state)
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

async fn signup(app: &Router, email: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "name": "Tester", "email": email, "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app().await;

    let (status, body) = send_json(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "leafling");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = test_app().await;

    let (status, body) = send_json(&app, "GET", "/plants", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_signup_login_roundtrip() {
    let app = test_app().await;
    signup(&app, "user@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "user@example.com", "password": "hunter22" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let app = test_app().await;
    signup(&app, "user@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "user@example.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = test_app().await;
    signup(&app, "user@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "name": "Tester", "email": "user@example.com", "password": "hunter22" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already exists");
}

#[tokio::test]
async fn test_plant_crud_roundtrip() {
    let app = test_app().await;
    let token = signup(&app, "user@example.com").await;

    let (status, created) = send_json(
        &app,
        "POST",
        "/plants",
        Some(&token),
        Some(json!({ "name": "Freddy", "species": "Monstera deliciosa" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let plant_id = created["id"].as_i64().unwrap();

    let (status, listed) = send_json(&app, "GET", "/plants", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, detail) = send_json(
        &app,
        "GET",
        &format!("/plants/{}", plant_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Freddy");
    assert!(detail["logs"].as_array().unwrap().is_empty());

    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/plants/{}", plant_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/plants/{}", plant_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_plant_is_not_found() {
    let app = test_app().await;
    let owner_token = signup(&app, "owner@example.com").await;
    let stranger_token = signup(&app, "stranger@example.com").await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/plants",
        Some(&owner_token),
        Some(json!({ "name": "Freddy" })),
    )
    .await;
    let plant_id = created["id"].as_i64().unwrap();

    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/plants/{}", plant_id),
        Some(&stranger_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_log_batch_is_rejected() {
    let app = test_app().await;
    let token = signup(&app, "user@example.com").await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/plants",
        Some(&token),
        Some(json!({ "name": "Freddy" })),
    )
    .await;
    let plant_id = created["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/plants/{}/logs", plant_id),
        Some(&token),
        Some(json!({ "logs": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Logs must be a non-empty array");
}

#[tokio::test]
async fn test_recommendation_endpoint_reports_cache_status() {
    let app = test_app().await;
    let token = signup(&app, "user@example.com").await;

    let image = {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;
        STANDARD.encode(b"leaf-photo")
    };
    let (_, created) = send_json(
        &app,
        "POST",
        "/plants",
        Some(&token),
        Some(json!({ "name": "Freddy", "image_base64": image })),
    )
    .await;
    let plant_id = created["id"].as_i64().unwrap();

    let uri = format!("/plants/{}/ai-recommendations", plant_id);

    let (status, first) = send_json(&app, "POST", &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "new");
    assert_eq!(first["data"]["species"], "Monstera deliciosa");

    let (status, second) = send_json(&app, "POST", &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "cached");

    let (status, forced) = send_json(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({ "force": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(forced["status"], "new");
}

#[tokio::test]
async fn test_recommendation_without_image_is_bad_request() {
    let app = test_app().await;
    let token = signup(&app, "user@example.com").await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/plants",
        Some(&token),
        Some(json!({ "name": "Freddy" })),
    )
    .await;
    let plant_id = created["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/plants/{}/ai-recommendations", plant_id),
        Some(&token),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no image"));
}

#[tokio::test]
async fn test_care_tips_endpoint_reports_cache_status() {
    let app = test_app().await;
    let token = signup(&app, "user@example.com").await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/plants",
        Some(&token),
        Some(json!({ "name": "Freddy" })),
    )
    .await;
    let plant_id = created["id"].as_i64().unwrap();

    let uri = format!("/plants/{}/care-tips", plant_id);

    let (status, first) = send_json(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "new");
    assert_eq!(first["careTips"]["tips"]["general"], "keep it simple");

    let (status, second) = send_json(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "cached");
}

#[tokio::test]
async fn test_profile_roundtrip() {
    let app = test_app().await;
    let token = signup(&app, "user@example.com").await;

    let (status, profile) = send_json(&app, "GET", "/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "user@example.com");
    assert_eq!(profile["has_profile_image"], false);

    let (status, updated) = send_json(
        &app,
        "PUT",
        "/users/profile",
        Some(&token),
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed");
}
