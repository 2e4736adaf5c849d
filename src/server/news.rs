use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{
    CreateArticleRequest, CreatedId, DeletedArticle, Item, Items, LimitParams, ListNewsParams,
};
use crate::server::response::{ApiError, StoreOptionExt};
use crate::server::validation::clamp_limit;
use crate::types::{NewArticle, Section};

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// GET /api/news - published articles, optionally one section
pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListNewsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(params.limit, 20, 100);

    // An unknown section matches nothing, same as filtering on it would.
    let section = match params.section.as_deref() {
        Some(raw) => match raw.parse::<Section>() {
            Ok(section) => Some(section),
            Err(_) => return Ok(Json(Items::new(Vec::new()))),
        },
        None => None,
    };

    let items = state
        .store
        .list_published(section, limit)
        .map_err(|_| ApiError::internal("Failed to list articles"))?;

    Ok(Json(Items::new(items)))
}

/// GET /api/news/{id} - one published article; drafts stay invisible
pub async fn get_news(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::not_found("Article not found"))?;

    let article = state
        .store
        .get_published(id)
        .map_err(|_| ApiError::internal("Failed to load article"))?
        .or_not_found("Article not found")?;

    Ok(Json(Item::new(article)))
}

/// POST /api/news - create an article (admin)
pub async fn create_news(
    RequireAdmin(auth): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = trimmed(req.title);
    let section = trimmed(req.section);

    let (Some(title), Some(section)) = (title, section) else {
        return Err(ApiError::bad_request("Title and section are required"));
    };

    let section: Section = section
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid section"))?;

    let id = state
        .store
        .create_article(&NewArticle {
            title,
            section,
            image_url: trimmed(req.image_url),
            excerpt: trimmed(req.excerpt),
            content: trimmed(req.content),
            published: req.published,
            author_id: Some(auth.user.id),
        })
        .map_err(|_| ApiError::internal("Failed to create article"))?;

    Ok((StatusCode::CREATED, Json(CreatedId::new(id))))
}

/// DELETE /api/news/{id} - delete an article and its favorite rows (admin)
pub async fn delete_news(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: i64 = id.parse().map_err(|_| ApiError::bad_request("Invalid id"))?;
    if id <= 0 {
        return Err(ApiError::bad_request("Invalid id"));
    }

    let removed = state
        .store
        .delete_article(id)
        .map_err(|_| ApiError::internal("Failed to delete article"))?;
    if !removed {
        return Err(ApiError::not_found("Article not found"));
    }

    Ok(Json(DeletedArticle {
        ok: true,
        msg: "Article deleted".to_string(),
        id,
    }))
}

/// GET /api/admin/news - all articles, drafts included (admin)
pub async fn list_admin_news(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(params.limit, 50, 200);

    let items = state
        .store
        .list_articles(limit)
        .map_err(|_| ApiError::internal("Failed to list articles"))?;

    Ok(Json(Items::new(items)))
}
