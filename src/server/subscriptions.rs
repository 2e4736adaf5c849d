use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{Items, LimitParams, OkMsg, SubscribeRequest};
use crate::server::response::ApiError;
use crate::server::validation::{clamp_limit, is_valid_email};

/// POST /api/subscribe - public newsletter signup
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.unwrap_or_default();
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    match state.store.add_subscriber(&email) {
        Ok(_) => Ok((StatusCode::CREATED, Json(OkMsg::new("Thanks for subscribing!")))),
        Err(Error::AlreadyExists) => Err(ApiError::conflict("That email is already subscribed")),
        Err(_) => Err(ApiError::internal("Failed to subscribe")),
    }
}

/// GET /api/admin/subscribers - subscriber listing (admin)
pub async fn list_subscribers(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(params.limit, 200, 1000);

    let items = state
        .store
        .list_subscribers(limit)
        .map_err(|_| ApiError::internal("Failed to list subscribers"))?;

    Ok(Json(Items::new(items)))
}

/// DELETE /api/admin/subscribers/{id} - remove one subscriber (admin)
pub async fn delete_subscriber(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: i64 = id.parse().map_err(|_| ApiError::bad_request("Invalid id"))?;

    // Deleting an id that is already gone still reports success.
    state
        .store
        .delete_subscriber(id)
        .map_err(|_| ApiError::internal("Failed to delete subscriber"))?;

    Ok(Json(OkMsg::new("Subscriber removed")))
}
