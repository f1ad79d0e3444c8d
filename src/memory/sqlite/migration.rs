// src/memory/sqlite/migration.rs
//! Schema setup for the conversation database. Run at startup; every
//! statement is idempotent.

use anyhow::Result;
use sqlx::{Executor, SqlitePool};
use tracing::info;

/// Session rows. The persona column holds the full JSON snapshot so the
/// trait vector survives restarts without a column per trait.
const CREATE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    persona TEXT NOT NULL,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);
"#;

const CREATE_MESSAGES: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    emotion TEXT,
    timestamp DATETIME NOT NULL
);
"#;

/// Single-row bot profile, stored as one JSON document.
const CREATE_BOT_PROFILE: &str = r#"
CREATE TABLE IF NOT EXISTS bot_profile (
    id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    updated_at DATETIME NOT NULL
);
"#;

/// One row per (user, category); keywords stored as a JSON array.
const CREATE_WORLDVIEW: &str = r#"
CREATE TABLE IF NOT EXISTS worldview_records (
    user_id TEXT NOT NULL,
    category TEXT NOT NULL,
    keywords TEXT NOT NULL,
    weight REAL NOT NULL,
    description TEXT NOT NULL,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL,
    PRIMARY KEY (user_id, category)
);
"#;

const CREATE_INDICES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
"#;

pub async fn run_migration(pool: &SqlitePool) -> Result<()> {
    pool.execute(CREATE_SESSIONS).await?;
    pool.execute(CREATE_MESSAGES).await?;
    pool.execute(CREATE_BOT_PROFILE).await?;
    pool.execute(CREATE_WORLDVIEW).await?;
    pool.execute(CREATE_INDICES).await?;
    info!("sqlite migration complete");
    Ok(())
}
