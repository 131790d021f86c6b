//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::AuthError, models::UserSummary, validation};

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for user login
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    validation::validate_username(&payload.username).map_err(AuthError::Validation)?;
    validation::validate_password(&payload.password).map_err(AuthError::Validation)?;

    let user = state
        .auth_service
        .register(&payload.username, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let key = payload.username.to_lowercase();

    if !state.login_throttle.is_allowed(&key).await {
        info!("Throttled login attempt for {}", key);
        return Err(AuthError::RateLimited);
    }

    match state
        .auth_service
        .login(&payload.username, &payload.password)
        .await
    {
        Ok((token, user)) => {
            state.login_throttle.reset(&key).await;
            Ok((StatusCode::OK, Json(LoginResponse { token, user })))
        }
        Err(AuthError::InvalidCredentials) => {
            state.login_throttle.record_failure(&key).await;
            Err(AuthError::InvalidCredentials)
        }
        Err(e) => Err(e),
    }
}
