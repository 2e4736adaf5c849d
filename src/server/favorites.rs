use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{Items, ToggleResponse};
use crate::server::response::ApiError;

/// GET /api/favorites - the current user's favorite article ids
pub async fn list_favorites(
    RequireAuth(auth): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .store
        .list_favorite_ids(auth.user.id)
        .map_err(|_| ApiError::internal("Failed to list favorites"))?;

    Ok(Json(Items::new(items)))
}

/// POST /api/favorites/{id} - toggle one favorite and return the full set
pub async fn toggle_favorite(
    RequireAuth(auth): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let article_id: i64 = article_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid article id"))?;
    if article_id <= 0 {
        return Err(ApiError::bad_request("Invalid article id"));
    }

    // No check that the article exists or is published; a favorite may point
    // at an id that was never created.
    let user_id = auth.user.id;
    let exists = state
        .store
        .favorite_exists(user_id, article_id)
        .map_err(|_| ApiError::internal("Failed to check favorite"))?;

    let action = if exists {
        state
            .store
            .remove_favorite(user_id, article_id)
            .map_err(|_| ApiError::internal("Failed to remove favorite"))?;
        "removed"
    } else {
        // A concurrent toggle can win the insert race; the unique pair
        // constraint surfaces it as a benign conflict.
        match state.store.add_favorite(user_id, article_id) {
            Ok(()) => "added",
            Err(Error::AlreadyExists) => {
                return Err(ApiError::conflict("Favorite already exists"));
            }
            Err(_) => return Err(ApiError::internal("Failed to add favorite")),
        }
    };

    let items = state
        .store
        .list_favorite_ids(user_id)
        .map_err(|_| ApiError::internal("Failed to list favorites"))?;

    Ok(Json(ToggleResponse {
        ok: true,
        action,
        items,
    }))
}
