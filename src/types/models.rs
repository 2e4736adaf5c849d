use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Role, Section};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Server-side session row. The raw token only ever lives in the cookie;
/// the row keeps an argon2id hash plus a short unique lookup key.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token_hash: String,
    pub token_lookup: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub section: Section,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub published: bool,
    #[serde(skip)]
    pub author_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Listing shape for the public feed: no body, published implied.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub section: Section,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing shape for the admin panel: drafts included, so the flag is carried.
#[derive(Debug, Clone, Serialize)]
pub struct AdminArticleSummary {
    pub id: i64,
    pub title: String,
    pub section: Section,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub section: Section,
    pub image_url: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub published: bool,
    pub author_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of one campaign send attempt.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignLog {
    pub id: i64,
    pub campaign_id: i64,
    pub sent_to: i64,
    pub success_count: i64,
    pub preview_links: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaignLog {
    pub campaign_id: i64,
    pub sent_to: i64,
    pub success_count: i64,
    pub preview_links: Vec<String>,
}
