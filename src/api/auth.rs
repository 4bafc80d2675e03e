//! Authentication: signup, login, and the bearer-token middleware
//!
//! Passwords are bcrypt-hashed; sessions are stateless JWTs signed with
//! the configured secret. Protected routes run behind `require_auth`,
//! which inserts a [`CurrentUser`] extension for handlers.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::user::UserSummary;
use crate::AppState;

/// JWT claims carried by the bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub exp: i64,
}

/// The authenticated caller, inserted into request extensions by
/// `require_auth`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

fn issue_token(state: &AppState, user_id: i64, email: &str) -> ApiResult<String> {
    let claims = Claims {
        user_id,
        email: email.to_string(),
        exp: (Utc::now() + Duration::minutes(state.config.token_ttl_minutes)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<(axum::http::StatusCode, Json<AuthResponse>)> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(ApiError::BadRequest(
            "name, email and password are required".to_string(),
        ));
    }

    // bcrypt is CPU-bound; keep it off the async workers
    let password = payload.password.clone();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let user = db::users::create_user(&state.db, &payload.name, &payload.email, &hash).await?;
    let token = issue_token(&state, user.id, &user.email)?;

    info!(user_id = user.id, "User registered");

    Ok((
        axum::http::StatusCode::CREATED,
        Json(AuthResponse {
            message: format!("User {} created successfully", user.name),
            token,
            user,
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::AuthRequired("Invalid email or password".to_string());

    let user = db::users::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid)?;

    let password = payload.password.clone();
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("Failed to verify password: {}", e)))?;

    if !valid {
        return Err(invalid());
    }

    let token = issue_token(&state, user.id, &user.email)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserSummary {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    }))
}

/// GET /auth/users
pub async fn list_users(
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let users = db::users::list_users(&state.db).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "users": users,
    })))
}

/// Bearer-token middleware for protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::AuthRequired("Missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::AuthRequired("Expected bearer token".to_string()))?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| ApiError::AuthRequired(format!("Invalid token: {}", e)))?
    .claims;

    request.extensions_mut().insert(CurrentUser {
        user_id: claims.user_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Build public auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/users", get(list_users))
}
