pub const SCHEMA: &str = r#"
-- Registered accounts; the first-boot admin is seeded into this table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,            -- stored case-folded
    password_hash TEXT NOT NULL,           -- argon2id hash with embedded salt
    role TEXT NOT NULL DEFAULT 'user',     -- 'user' | 'admin'
    created_at TEXT DEFAULT (datetime('now'))
);

-- Server-side sessions; the cookie holds the raw token, the row its hash
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,              -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,            -- short token prefix for fast lookup
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    last_seen_at TEXT
);

-- Articles
CREATE TABLE IF NOT EXISTS news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    section TEXT NOT NULL,                 -- pokemon | starwars | lotr | medieval
    image_url TEXT,
    excerpt TEXT,                          -- short summary for listings
    content TEXT,                          -- full body
    published INTEGER NOT NULL DEFAULT 0,  -- 0 = draft, 1 = published
    author_id INTEGER REFERENCES users(id),
    created_at TEXT DEFAULT (datetime('now'))
);

-- Favorites: many-to-many between users and articles.
-- news_id is intentionally not a foreign key; article deletion clears
-- its rows inside the same transaction instead.
CREATE TABLE IF NOT EXISTS favorites (
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    news_id INTEGER NOT NULL,
    PRIMARY KEY (user_id, news_id)
);

-- Newsletter subscribers
CREATE TABLE IF NOT EXISTS subscriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Authored newsletter campaigns; immutable once created
CREATE TABLE IF NOT EXISTS campaigns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- One row per send attempt, append-only
CREATE TABLE IF NOT EXISTS campaign_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id INTEGER NOT NULL REFERENCES campaigns(id),
    sent_to INTEGER NOT NULL,
    success_count INTEGER NOT NULL,
    preview_links_json TEXT,               -- JSON array of preview URLs
    created_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_lookup ON sessions(token_lookup);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_news_section ON news(section);
CREATE INDEX IF NOT EXISTS idx_news_published ON news(published);
CREATE INDEX IF NOT EXISTS idx_favorites_news ON favorites(news_id);
CREATE INDEX IF NOT EXISTS idx_campaign_logs_campaign ON campaign_logs(campaign_id);
"#;
