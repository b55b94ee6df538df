pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- subscriptions table
CREATE TABLE IF NOT EXISTS subscriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    project_limit INTEGER NOT NULL
);

INSERT OR IGNORE INTO subscriptions (id, name, project_limit) VALUES (1, 'free', 1);
INSERT OR IGNORE INTO subscriptions (id, name, project_limit) VALUES (2, 'pro', 10);

-- users table
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL DEFAULT 'user',
    subscription_id INTEGER NOT NULL DEFAULT 1 REFERENCES subscriptions(id)
);

-- projects table
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id),
    name TEXT NOT NULL,
    description TEXT,
    topic TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_projects_owner_id ON projects(owner_id);

-- users_to_projects table (membership, owner excluded)
CREATE TABLE IF NOT EXISTS users_to_projects (
    user_id INTEGER NOT NULL REFERENCES users(id),
    project_id INTEGER NOT NULL REFERENCES projects(id),
    PRIMARY KEY (user_id, project_id)
);

-- keywords table (visible = 0 is a soft delete)
CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    content TEXT NOT NULL,
    searches INTEGER NOT NULL DEFAULT 0 CHECK (searches >= 0),
    processed INTEGER NOT NULL DEFAULT 0,
    visible INTEGER NOT NULL DEFAULT 1,
    UNIQUE(project_id, content)
);

CREATE INDEX IF NOT EXISTS idx_keywords_project_searches ON keywords(project_id, searches);

-- rss_atom table (feed sources)
CREATE TABLE IF NOT EXISTS rss_atom (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    url TEXT NOT NULL,
    provenance TEXT NOT NULL DEFAULT 'manual',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(project_id, url)
);

-- news table
CREATE TABLE IF NOT EXISTS news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    summary TEXT,
    source TEXT NOT NULL,
    published_at INTEGER NOT NULL,
    rss_atom_id INTEGER REFERENCES rss_atom(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_news_published_at ON news(published_at DESC);

-- keywords_to_news table
CREATE TABLE IF NOT EXISTS keywords_to_news (
    keyword_id INTEGER NOT NULL REFERENCES keywords(id),
    news_id INTEGER NOT NULL REFERENCES news(id),
    PRIMARY KEY (keyword_id, news_id)
);

-- saved_news table
CREATE TABLE IF NOT EXISTS saved_news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id),
    source_news_id INTEGER NOT NULL REFERENCES news(id),
    title TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    category TEXT,
    views INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_saved_news_project_id ON saved_news(project_id);
"#;
