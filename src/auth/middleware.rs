use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::session::{SessionTokenGenerator, parse_session_token, session_token_from_headers};
use crate::server::AppState;
use crate::types::{Session, User};

/// A resolved session together with its owning user.
pub struct AuthSession {
    pub session: Session,
    pub user: User,
}

/// Extractor that never rejects; yields the session when one resolves.
/// Used by the session probe endpoint.
pub struct CurrentUser(pub Option<AuthSession>);

/// Extractor that requires a valid session
pub struct RequireAuth(pub AuthSession);

/// Extractor that requires a valid session whose user has the admin role
pub struct RequireAdmin(pub AuthSession);

#[derive(Debug)]
pub enum AuthError {
    MissingSession,
    InvalidSession,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingSession => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid session"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "ok": false, "msg": message });
        (status, Json(body)).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolve_session(parts, state).ok().flatten()))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth = resolve_session(parts, state)?.ok_or(AuthError::MissingSession)?;
        Ok(RequireAuth(auth))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Resolves the session itself rather than assuming the
        // authenticated gate already ran.
        let auth = resolve_session(parts, state)?.ok_or(AuthError::MissingSession)?;

        if !auth.user.role.is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(auth))
    }
}

/// Resolves the session cookie to a session + user pair.
/// Ok(None) means "no usable session"; Err is reserved for store failures.
fn resolve_session(
    parts: &Parts,
    state: &Arc<AppState>,
) -> Result<Option<AuthSession>, AuthError> {
    let Some(raw_token) = session_token_from_headers(&parts.headers) else {
        return Ok(None);
    };

    let Ok((lookup, _secret)) = parse_session_token(&raw_token) else {
        return Ok(None);
    };

    let Some(session) = state
        .store
        .get_session_by_lookup(&lookup)
        .map_err(|_| AuthError::InternalError)?
    else {
        return Ok(None);
    };

    let generator = SessionTokenGenerator::new();
    if !generator
        .verify(&raw_token, &session.token_hash)
        .map_err(|_| AuthError::InternalError)?
    {
        return Ok(None);
    }

    let Some(user) = state
        .store
        .get_user(session.user_id)
        .map_err(|_| AuthError::InternalError)?
    else {
        return Ok(None);
    };

    if let Err(e) = state.store.update_session_last_seen(&session.id) {
        tracing::warn!("Failed to update session last_seen_at: {e}");
    }

    Ok(Some(AuthSession { session, user }))
}
