mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::auth::PasswordHasher;
use crate::error::Result;
use crate::types::*;

/// Email of the account seeded on first boot. Rotate or remove it in any
/// real deployment.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@geek.news";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<i64>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn update_session_last_seen(&self, id: &str) -> Result<()>;

    // Article operations
    fn create_article(&self, article: &NewArticle) -> Result<i64>;
    fn list_published(&self, section: Option<Section>, limit: i64) -> Result<Vec<ArticleSummary>>;
    fn get_published(&self, id: i64) -> Result<Option<Article>>;
    fn list_articles(&self, limit: i64) -> Result<Vec<AdminArticleSummary>>;
    /// Deletes the article and its favorite rows in one transaction.
    fn delete_article(&self, id: i64) -> Result<bool>;

    // Favorite operations (many-to-many with articles)
    fn favorite_exists(&self, user_id: i64, article_id: i64) -> Result<bool>;
    fn add_favorite(&self, user_id: i64, article_id: i64) -> Result<()>;
    fn remove_favorite(&self, user_id: i64, article_id: i64) -> Result<bool>;
    fn list_favorite_ids(&self, user_id: i64) -> Result<Vec<i64>>;

    // Subscriber operations
    fn add_subscriber(&self, email: &str) -> Result<i64>;
    fn list_subscribers(&self, limit: i64) -> Result<Vec<Subscriber>>;
    fn delete_subscriber(&self, id: i64) -> Result<bool>;
    /// Full recipient list, read fresh at campaign send time.
    fn list_subscriber_emails(&self) -> Result<Vec<String>>;

    // Campaign operations
    fn create_campaign(&self, subject: &str, body: &str) -> Result<i64>;
    fn get_campaign(&self, id: i64) -> Result<Option<Campaign>>;
    fn list_campaigns(&self, limit: i64) -> Result<Vec<Campaign>>;
    fn append_campaign_log(&self, log: &NewCampaignLog) -> Result<i64>;
    fn list_campaign_logs(&self, campaign_id: i64) -> Result<Vec<CampaignLog>>;

    fn close(&self) -> Result<()>;
}

/// Creates the well-known admin account if no row with its email exists.
/// Returns the new user id, or None when the account was already present.
pub fn seed_default_admin(store: &dyn Store) -> Result<Option<i64>> {
    if store.get_user_by_email(DEFAULT_ADMIN_EMAIL)?.is_some() {
        return Ok(None);
    }

    let hash = PasswordHasher::new().hash(DEFAULT_ADMIN_PASSWORD)?;
    let id = store.create_user(DEFAULT_ADMIN_EMAIL, &hash, Role::Admin)?;
    tracing::warn!(
        "seeded default admin account {DEFAULT_ADMIN_EMAIL}; rotate this password before exposing the server"
    );
    Ok(Some(id))
}
