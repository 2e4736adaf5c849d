use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{
    CurrentUser, RequireAuth, SessionTokenGenerator, clear_session_cookie, session_cookie,
};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, MeResponse, OkMsg, RegisterRequest};
use crate::server::response::ApiError;
use crate::server::validation::MIN_PASSWORD_LEN;
use crate::types::{Role, Session};

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password), Some(confirm)) = (req.email, req.password, req.confirm)
    else {
        return Err(ApiError::bad_request("All fields are required"));
    };
    if email.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password != confirm {
        return Err(ApiError::bad_request("Passwords do not match"));
    }

    let key = email.trim().to_lowercase();

    let existing = state
        .store
        .get_user_by_email(&key)
        .map_err(|_| ApiError::internal("Failed to check existing account"))?;
    if existing.is_some() {
        return Err(ApiError::conflict("That email is already registered"));
    }

    let hash = crate::auth::PasswordHasher::new()
        .hash(&password)
        .map_err(|_| ApiError::internal("Failed to hash password"))?;

    // The unique index backstops the existence check above; a racing
    // duplicate registration still comes back as a conflict.
    match state.store.create_user(&key, &hash, Role::User) {
        Ok(_) => Ok((StatusCode::CREATED, Json(OkMsg::new("Registration successful")))),
        Err(Error::AlreadyExists) => Err(ApiError::conflict("That email is already registered")),
        Err(_) => Err(ApiError::internal("Failed to create account")),
    }
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::bad_request("Missing credentials"));
    };
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Missing credentials"));
    }

    let key = email.trim().to_lowercase();

    // Unknown account and bad password are indistinguishable on the wire.
    let user = state
        .store
        .get_user_by_email(&key)
        .map_err(|_| ApiError::internal("Failed to look up account"))?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let valid = crate::auth::PasswordHasher::new()
        .verify(&password, &user.password_hash)
        .map_err(|_| ApiError::internal("Failed to verify password"))?;
    if !valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let generator = SessionTokenGenerator::new();

    const MAX_RETRIES: u32 = 3;
    for _ in 0..MAX_RETRIES {
        let (raw_token, lookup, hash) = generator
            .generate()
            .map_err(|_| ApiError::internal("Failed to generate session token"))?;

        let session = Session {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            user_id: user.id,
            created_at: Utc::now(),
            last_seen_at: None,
        };

        match state.store.create_session(&session) {
            Ok(()) => {
                return Ok((
                    [(SET_COOKIE, session_cookie(&raw_token))],
                    Json(OkMsg::new("Logged in")),
                ));
            }
            Err(Error::SessionLookupCollision) => continue,
            Err(_) => return Err(ApiError::internal("Failed to create session")),
        }
    }

    Err(ApiError::internal("Failed to create session after retries"))
}

pub async fn me(CurrentUser(auth): CurrentUser) -> Json<MeResponse> {
    match auth {
        Some(auth) => Json(MeResponse {
            logged_in: true,
            email: Some(auth.user.email),
            user_id: Some(auth.user.id),
            role: Some(auth.user.role),
        }),
        None => Json(MeResponse::anonymous()),
    }
}

pub async fn logout(
    RequireAuth(auth): RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(e) = state.store.delete_session(&auth.session.id) {
        tracing::warn!("Failed to delete session: {e}");
    }

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        Json(OkMsg::new("Session closed")),
    ))
}
