use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn map_article_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        section: row.get(2)?,
        image_url: row.get(3)?,
        excerpt: row.get(4)?,
        content: row.get(5)?,
        published: row.get::<_, i64>(6)? != 0,
        author_id: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn map_summary_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArticleSummary> {
    Ok(ArticleSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        section: row.get(2)?,
        image_url: row.get(3)?,
        excerpt: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<i64> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO users (email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![email, password_hash, role, format_datetime(&Utc::now())],
        );

        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            map_user_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            map_user_row,
        )
        .optional()
        .map_err(Error::from)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.token_hash,
                session.token_lookup,
                session.user_id,
                format_datetime(&session.created_at),
                session.last_seen_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::SessionLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, user_id, created_at, last_seen_at
             FROM sessions WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    user_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    last_seen_at: row
                        .get::<_, Option<String>>(5)?
                        .as_deref()
                        .map(parse_datetime),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_session_last_seen(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_seen_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Article operations

    fn create_article(&self, article: &NewArticle) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO news (title, section, image_url, excerpt, content, published, author_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                article.title,
                article.section,
                article.image_url,
                article.excerpt,
                article.content,
                article.published as i64,
                article.author_id,
                format_datetime(&Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_published(&self, section: Option<Section>, limit: i64) -> Result<Vec<ArticleSummary>> {
        let conn = self.conn();

        let rows = match section {
            Some(section) => {
                let mut stmt = conn.prepare(
                    "SELECT id, title, section, image_url, excerpt, created_at
                     FROM news WHERE published = 1 AND section = ?1
                     ORDER BY id DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![section, limit], map_summary_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, title, section, image_url, excerpt, created_at
                     FROM news WHERE published = 1
                     ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], map_summary_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        Ok(rows)
    }

    fn get_published(&self, id: i64) -> Result<Option<Article>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, title, section, image_url, excerpt, content, published, author_id, created_at
             FROM news WHERE id = ?1 AND published = 1",
            params![id],
            map_article_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_articles(&self, limit: i64) -> Result<Vec<AdminArticleSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, title, section, image_url, excerpt, published, created_at
             FROM news ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(AdminArticleSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                section: row.get(2)?,
                image_url: row.get(3)?,
                excerpt: row.get(4)?,
                published: row.get::<_, i64>(5)? != 0,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_article(&self, id: i64) -> Result<bool> {
        // Favorite rows carry no foreign key to news; both deletes must land
        // or neither, so they share one transaction.
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM favorites WHERE news_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM news WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // Favorite operations

    fn favorite_exists(&self, user_id: i64, article_id: i64) -> Result<bool> {
        let conn = self.conn();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM favorites WHERE user_id = ?1 AND news_id = ?2",
                params![user_id, article_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn add_favorite(&self, user_id: i64, article_id: i64) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO favorites (user_id, news_id) VALUES (?1, ?2)",
            params![user_id, article_id],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn remove_favorite(&self, user_id: i64, article_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM favorites WHERE user_id = ?1 AND news_id = ?2",
            params![user_id, article_id],
        )?;
        Ok(rows > 0)
    }

    fn list_favorite_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT news_id FROM favorites WHERE user_id = ?1 ORDER BY news_id")?;

        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Subscriber operations

    fn add_subscriber(&self, email: &str) -> Result<i64> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO subscriptions (email, created_at) VALUES (?1, ?2)",
            params![email, format_datetime(&Utc::now())],
        );

        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn list_subscribers(&self, limit: i64) -> Result<Vec<Subscriber>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, email, created_at FROM subscriptions ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(Subscriber {
                id: row.get(0)?,
                email: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_subscriber(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM subscriptions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list_subscriber_emails(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT email FROM subscriptions ORDER BY id DESC")?;

        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Campaign operations

    fn create_campaign(&self, subject: &str, body: &str) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO campaigns (subject, body, created_at) VALUES (?1, ?2, ?3)",
            params![subject, body, format_datetime(&Utc::now())],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, subject, body, created_at FROM campaigns WHERE id = ?1",
            params![id],
            |row| {
                Ok(Campaign {
                    id: row.get(0)?,
                    subject: row.get(1)?,
                    body: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_campaigns(&self, limit: i64) -> Result<Vec<Campaign>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, subject, body, created_at FROM campaigns ORDER BY id DESC LIMIT ?1")?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(Campaign {
                id: row.get(0)?,
                subject: row.get(1)?,
                body: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn append_campaign_log(&self, log: &NewCampaignLog) -> Result<i64> {
        let links = serde_json::to_string(&log.preview_links)
            .map_err(|e| Error::Config(format!("failed to encode preview links: {e}")))?;

        let conn = self.conn();
        conn.execute(
            "INSERT INTO campaign_logs (campaign_id, sent_to, success_count, preview_links_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                log.campaign_id,
                log.sent_to,
                log.success_count,
                links,
                format_datetime(&Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_campaign_logs(&self, campaign_id: i64) -> Result<Vec<CampaignLog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, campaign_id, sent_to, success_count, preview_links_json, created_at
             FROM campaign_logs WHERE campaign_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![campaign_id], |row| {
            let links: Option<String> = row.get(4)?;
            Ok(CampaignLog {
                id: row.get(0)?,
                campaign_id: row.get(1)?,
                sent_to: row.get(2)?,
                success_count: row.get(3)?,
                preview_links: links
                    .as_deref()
                    .and_then(|s| serde_json::from_str(s).ok())
                    .unwrap_or_default(),
                created_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn insert_article(store: &SqliteStore, title: &str, section: Section, published: bool) -> i64 {
        store
            .create_article(&NewArticle {
                title: title.to_string(),
                section,
                image_url: None,
                excerpt: None,
                content: Some("body".to_string()),
                published,
                author_id: None,
            })
            .unwrap()
    }

    #[test]
    fn test_initialize_creates_schema() {
        let (_temp, store) = open_store();

        let conn = store.connection();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"sessions".to_string()));
        assert!(tables.contains(&"news".to_string()));
        assert!(tables.contains(&"favorites".to_string()));
        assert!(tables.contains(&"subscriptions".to_string()));
        assert!(tables.contains(&"campaigns".to_string()));
        assert!(tables.contains(&"campaign_logs".to_string()));
    }

    #[test]
    fn test_user_crud_and_unique_email() {
        let (_temp, store) = open_store();

        let id = store
            .create_user("a@example.com", "$argon2id$stub", Role::User)
            .unwrap();

        let fetched = store.get_user(id).unwrap().unwrap();
        assert_eq!(fetched.email, "a@example.com");
        assert_eq!(fetched.role, Role::User);

        let by_email = store.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, id);

        let dup = store.create_user("a@example.com", "$argon2id$stub2", Role::User);
        assert!(matches!(dup, Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_session_lookup_collision() {
        let (_temp, store) = open_store();
        let user_id = store
            .create_user("a@example.com", "hash", Role::User)
            .unwrap();

        let session1 = Session {
            id: "session-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup123".to_string(),
            user_id,
            created_at: Utc::now(),
            last_seen_at: None,
        };
        store.create_session(&session1).unwrap();

        let session2 = Session {
            id: "session-2".to_string(),
            token_hash: "hash2".to_string(),
            token_lookup: "lookup123".to_string(), // Same lookup
            user_id,
            created_at: Utc::now(),
            last_seen_at: None,
        };

        let result = store.create_session(&session2);
        assert!(matches!(result, Err(Error::SessionLookupCollision)));

        let fetched = store.get_session_by_lookup("lookup123").unwrap().unwrap();
        assert_eq!(fetched.id, "session-1");

        assert!(store.delete_session("session-1").unwrap());
        assert!(!store.delete_session("session-1").unwrap());
        assert!(store.get_session_by_lookup("lookup123").unwrap().is_none());
    }

    #[test]
    fn test_published_listing_hides_drafts() {
        let (_temp, store) = open_store();

        let published = insert_article(&store, "out", Section::Pokemon, true);
        let draft = insert_article(&store, "draft", Section::Pokemon, false);

        let listed = store.list_published(None, 20).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, published);

        assert!(store.get_published(published).unwrap().is_some());
        assert!(store.get_published(draft).unwrap().is_none());

        // Admin listing sees both, newest first
        let all = store.list_articles(50).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, draft);
        assert!(!all[0].published);
    }

    #[test]
    fn test_published_listing_section_filter() {
        let (_temp, store) = open_store();

        insert_article(&store, "p1", Section::Pokemon, true);
        insert_article(&store, "s1", Section::Starwars, true);

        let pokemon = store.list_published(Some(Section::Pokemon), 20).unwrap();
        assert_eq!(pokemon.len(), 1);
        assert_eq!(pokemon[0].section, Section::Pokemon);
    }

    #[test]
    fn test_favorites_toggle_ops() {
        let (_temp, store) = open_store();
        let user_id = store
            .create_user("a@example.com", "hash", Role::User)
            .unwrap();

        assert!(!store.favorite_exists(user_id, 7).unwrap());
        store.add_favorite(user_id, 7).unwrap();
        assert!(store.favorite_exists(user_id, 7).unwrap());

        let dup = store.add_favorite(user_id, 7);
        assert!(matches!(dup, Err(Error::AlreadyExists)));

        store.add_favorite(user_id, 3).unwrap();
        assert_eq!(store.list_favorite_ids(user_id).unwrap(), vec![3, 7]);

        assert!(store.remove_favorite(user_id, 7).unwrap());
        assert!(!store.remove_favorite(user_id, 7).unwrap());
        assert_eq!(store.list_favorite_ids(user_id).unwrap(), vec![3]);
    }

    #[test]
    fn test_delete_article_clears_favorites() {
        let (_temp, store) = open_store();
        let user_id = store
            .create_user("a@example.com", "hash", Role::User)
            .unwrap();
        let article_id = insert_article(&store, "t", Section::Lotr, true);

        store.add_favorite(user_id, article_id).unwrap();

        assert!(store.delete_article(article_id).unwrap());
        assert!(store.list_favorite_ids(user_id).unwrap().is_empty());

        // Second delete finds nothing
        assert!(!store.delete_article(article_id).unwrap());
    }

    #[test]
    fn test_subscriber_unique_email() {
        let (_temp, store) = open_store();

        store.add_subscriber("a@x.com").unwrap();
        let dup = store.add_subscriber("a@x.com");
        assert!(matches!(dup, Err(Error::AlreadyExists)));

        let subs = store.list_subscribers(200).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].email, "a@x.com");

        let emails = store.list_subscriber_emails().unwrap();
        assert_eq!(emails, vec!["a@x.com".to_string()]);

        assert!(store.delete_subscriber(subs[0].id).unwrap());
        assert!(!store.delete_subscriber(subs[0].id).unwrap());
    }

    #[test]
    fn test_campaign_log_round_trip() {
        let (_temp, store) = open_store();

        let campaign_id = store.create_campaign("Subject", "Body").unwrap();
        let fetched = store.get_campaign(campaign_id).unwrap().unwrap();
        assert_eq!(fetched.subject, "Subject");

        let log_id = store
            .append_campaign_log(&NewCampaignLog {
                campaign_id,
                sent_to: 3,
                success_count: 2,
                preview_links: vec!["https://mail/1".to_string(), "https://mail/2".to_string()],
            })
            .unwrap();
        assert!(log_id > 0);

        let logs = store.list_campaign_logs(campaign_id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].sent_to, 3);
        assert_eq!(logs[0].success_count, 2);
        assert_eq!(logs[0].preview_links.len(), 2);
    }
}
