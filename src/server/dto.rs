use serde::{Deserialize, Serialize};

use crate::types::Role;

// Request bodies. Required fields are Options so a missing field produces
// the portal's own 400 body instead of a deserialization rejection.

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateArticleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCampaignRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListNewsParams {
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    #[serde(default)]
    pub limit: Option<i64>,
}

// Response bodies. Successful responses always carry `ok: true`; the field
// is a redundant echo of the 2xx status.

#[derive(Debug, Serialize)]
pub struct OkMsg {
    pub ok: bool,
    pub msg: String,
}

impl OkMsg {
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            ok: true,
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedId {
    pub ok: bool,
    pub id: i64,
}

impl CreatedId {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self { ok: true, id }
    }
}

#[derive(Debug, Serialize)]
pub struct Items<T: Serialize> {
    pub ok: bool,
    pub items: Vec<T>,
}

impl<T: Serialize> Items<T> {
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self { ok: true, items }
    }
}

#[derive(Debug, Serialize)]
pub struct Item<T: Serialize> {
    pub ok: bool,
    pub item: T,
}

impl<T: Serialize> Item<T> {
    #[must_use]
    pub fn new(item: T) -> Self {
        Self { ok: true, item }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl MeResponse {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            logged_in: false,
            email: None,
            user_id: None,
            role: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub ok: bool,
    pub action: &'static str,
    pub items: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct DeletedArticle {
    pub ok: bool,
    pub msg: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SendReport {
    pub ok: bool,
    pub msg: String,
    pub sent_to: usize,
    pub success_count: usize,
    pub preview_links: Vec<String>,
    pub log_id: i64,
}
