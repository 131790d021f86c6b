//! Photos service routes

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::PhotoError,
    guard::{AuthUser, auth_middleware, authorize},
    state::AppState,
};

/// Create the router for the photos service
pub fn create_router(state: AppState) -> Router {
    // Reads require a valid session; only mutations also check ownership.
    let protected_routes = Router::new()
        .route("/users/:user_id/photos/:photo_id", get(get_photo))
        .route("/users/:user_id/photos", post(upload_photo))
        .route("/users/:user_id/photos/:photo_id/setMain", post(set_main_photo))
        .route("/users/:user_id/photos/:photo_id/delete", post(delete_photo))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "photos-service"
    }))
}

/// Get a photo by ID
pub async fn get_photo(
    State(state): State<AppState>,
    Path((_user_id, photo_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, PhotoError> {
    let photo = state.lifecycle.get(photo_id).await?;
    Ok(Json(photo))
}

/// Upload a photo for a user (multipart image)
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(caller): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, PhotoError> {
    authorize(caller.id, user_id)?;

    let mut image: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PhotoError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| PhotoError::BadRequest(format!("Failed to read upload: {}", e)))?;
            image = Some(bytes.to_vec());
            break;
        }
    }

    let image =
        image.ok_or_else(|| PhotoError::BadRequest("Missing \"file\" field".to_string()))?;

    let photo = state.lifecycle.upload(user_id, image).await?;

    Ok((StatusCode::CREATED, Json(photo)))
}

/// Make a photo the user's main photo
pub async fn set_main_photo(
    State(state): State<AppState>,
    Path((user_id, photo_id)): Path<(Uuid, Uuid)>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse, PhotoError> {
    authorize(caller.id, user_id)?;

    state.lifecycle.set_main(user_id, photo_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a non-main photo
pub async fn delete_photo(
    State(state): State<AppState>,
    Path((user_id, photo_id)): Path<(Uuid, Uuid)>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse, PhotoError> {
    authorize(caller.id, user_id)?;

    state.lifecycle.delete(user_id, photo_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
