use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::error::Error;
use crate::newsletter;
use crate::server::AppState;
use crate::server::dto::{CreateCampaignRequest, CreatedId, Items, LimitParams, SendReport};
use crate::server::response::ApiError;
use crate::server::validation::clamp_limit;

/// POST /api/admin/campaigns - author a campaign (admin)
pub async fn create_campaign(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subject = req.subject.as_deref().map(str::trim).unwrap_or_default();
    let body = req.body.as_deref().map(str::trim).unwrap_or_default();
    if subject.is_empty() || body.is_empty() {
        return Err(ApiError::bad_request("Subject and body are required"));
    }

    let id = state
        .store
        .create_campaign(subject, body)
        .map_err(|_| ApiError::internal("Failed to create campaign"))?;

    Ok((StatusCode::CREATED, Json(CreatedId::new(id))))
}

/// GET /api/admin/campaigns - campaign listing (admin)
pub async fn list_campaigns(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(params.limit, 50, 200);

    let items = state
        .store
        .list_campaigns(limit)
        .map_err(|_| ApiError::internal("Failed to list campaigns"))?;

    Ok(Json(Items::new(items)))
}

/// POST /api/admin/campaigns/{id}/send - fan the campaign out to every
/// current subscriber (admin)
pub async fn send_campaign(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::not_found("Campaign not found"))?;

    let report = newsletter::send_campaign(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.dispatch,
        id,
    )
    .await
    .map_err(|e| match e {
        Error::NotFound => ApiError::not_found("Campaign not found"),
        Error::NothingToSend => ApiError::bad_request("No subscribers to send to"),
        other => {
            tracing::error!("campaign send failed: {other}");
            ApiError::internal("Failed to send campaign")
        }
    })?;

    Ok(Json(SendReport {
        ok: true,
        msg: "Simulated send complete".to_string(),
        sent_to: report.sent_to,
        success_count: report.success_count,
        preview_links: report.preview_links,
        log_id: report.log_id,
    }))
}
