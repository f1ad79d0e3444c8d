//! Async persistence seams. The orchestrator only sees these traits so
//! tests can swap the SQLite store for lighter fixtures.

use anyhow::Result;
use async_trait::async_trait;

use crate::memory::types::{BotProfile, ConversationMessage, ConversationSession};
use crate::worldview::WorldviewRecord;

/// Session rows and their message history.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session(&self, session_id: &str) -> Result<Option<ConversationSession>>;

    /// Insert or overwrite the session row, persona snapshot included.
    async fn upsert_session(&self, session: &ConversationSession) -> Result<()>;

    /// Append one message; returns its database id.
    async fn append_message(&self, message: &ConversationMessage) -> Result<i64>;

    /// Most recent `limit` messages in chronological order.
    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>>;

    async fn message_count(&self, session_id: &str) -> Result<u64>;

    /// Per-emotion message counts for the session summary, highest first.
    async fn emotion_counts(&self, session_id: &str) -> Result<Vec<(String, u64)>>;
}

/// The bot profile singleton and per-user worldview records.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self) -> Result<Option<BotProfile>>;

    async fn save_profile(&self, profile: &BotProfile) -> Result<()>;

    async fn load_worldview(&self, user_id: &str) -> Result<Vec<WorldviewRecord>>;

    /// Replace all of a user's records in one shot.
    async fn replace_worldview(&self, user_id: &str, records: &[WorldviewRecord]) -> Result<()>;
}
