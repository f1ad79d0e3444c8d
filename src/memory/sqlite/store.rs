//! SQLite implementation of the session and profile stores.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::memory::traits::{ProfileStore, SessionStore};
use crate::memory::types::{
    BotProfile, ConversationMessage, ConversationSession, MessageRole,
};
use crate::worldview::{WorldviewCategory, WorldviewRecord};

const PROFILE_ROW_ID: &str = "default";

pub struct SqliteStore {
    pub pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<ConversationSession>> {
        let row = sqlx::query(
            r#"
            SELECT session_id, user_id, persona, created_at, updated_at, active
            FROM sessions
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let persona_json: String = row.get("persona");
        let created_at: NaiveDateTime = row.get("created_at");
        let updated_at: NaiveDateTime = row.get("updated_at");

        Ok(Some(ConversationSession {
            session_id: row.get("session_id"),
            user_id: row.get("user_id"),
            persona: serde_json::from_str(&persona_json)?,
            created_at: Utc.from_utc_datetime(&created_at),
            updated_at: Utc.from_utc_datetime(&updated_at),
            active: row.get("active"),
        }))
    }

    async fn upsert_session(&self, session: &ConversationSession) -> Result<()> {
        let persona_json = serde_json::to_string(&session.persona)?;
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, persona, created_at, updated_at, active)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                persona = excluded.persona,
                updated_at = excluded.updated_at,
                active = excluded.active
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(persona_json)
        .bind(session.created_at.naive_utc())
        .bind(session.updated_at.naive_utc())
        .bind(session.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_message(&self, message: &ConversationMessage) -> Result<i64> {
        let emotion = message.emotion.map(|e| e.as_str().to_string());
        let row = sqlx::query(
            r#"
            INSERT INTO messages (session_id, role, content, emotion, timestamp)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&message.session_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(emotion)
        .bind(message.timestamp.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, role, content, emotion, timestamp
            FROM messages
            WHERE session_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let role: String = row.get("role");
            let emotion: Option<String> = row.get("emotion");
            let timestamp: NaiveDateTime = row.get("timestamp");
            messages.push(ConversationMessage {
                id: Some(row.get("id")),
                session_id: row.get("session_id"),
                role: MessageRole::from_str(&role).unwrap_or(MessageRole::User),
                content: row.get("content"),
                emotion: emotion.as_deref().and_then(|e| e.parse().ok()),
                timestamp: Utc.from_utc_datetime(&timestamp),
            });
        }

        // Fetched newest-first; callers want chronological order.
        messages.reverse();
        Ok(messages)
    }

    async fn message_count(&self, session_id: &str) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM messages WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as u64)
    }

    async fn emotion_counts(&self, session_id: &str) -> Result<Vec<(String, u64)>> {
        let rows = sqlx::query(
            r#"
            SELECT emotion, COUNT(*) AS n
            FROM messages
            WHERE session_id = ? AND emotion IS NOT NULL
            GROUP BY emotion
            ORDER BY n DESC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let emotion: String = row.get("emotion");
                let n: i64 = row.get("n");
                (emotion, n as u64)
            })
            .collect())
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn load_profile(&self) -> Result<Option<BotProfile>> {
        let row = sqlx::query("SELECT data FROM bot_profile WHERE id = ?")
            .bind(PROFILE_ROW_ID)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn save_profile(&self, profile: &BotProfile) -> Result<()> {
        let data = serde_json::to_string(profile)?;
        sqlx::query(
            r#"
            INSERT INTO bot_profile (id, data, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(PROFILE_ROW_ID)
        .bind(data)
        .bind(profile.updated_at.naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_worldview(&self, user_id: &str) -> Result<Vec<WorldviewRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, category, keywords, weight, description, created_at, updated_at
            FROM worldview_records
            WHERE user_id = ?
            ORDER BY category
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let category: String = row.get("category");
            // Rows with an unknown category tag are skipped, not errored.
            let Ok(category) = WorldviewCategory::from_str(&category) else {
                continue;
            };
            let keywords: String = row.get("keywords");
            let created_at: NaiveDateTime = row.get("created_at");
            let updated_at: NaiveDateTime = row.get("updated_at");
            records.push(WorldviewRecord {
                user_id: row.get("user_id"),
                category,
                keywords: serde_json::from_str(&keywords)?,
                weight: row.get("weight"),
                description: row.get("description"),
                created_at: Utc.from_utc_datetime(&created_at),
                updated_at: Utc.from_utc_datetime(&updated_at),
            });
        }
        Ok(records)
    }

    async fn replace_worldview(&self, user_id: &str, records: &[WorldviewRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM worldview_records WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for record in records {
            let keywords = serde_json::to_string(&record.keywords)?;
            sqlx::query(
                r#"
                INSERT INTO worldview_records
                    (user_id, category, keywords, weight, description, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user_id)
            .bind(record.category.as_str())
            .bind(keywords)
            .bind(record.weight)
            .bind(&record.description)
            .bind(record.created_at.naive_utc())
            .bind(record.updated_at.naive_utc())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionKind;
    use crate::persona::{Archetype, PersonaEngine};
    use sqlx::sqlite::SqliteConnectOptions;

    async fn store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("test.db"))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.unwrap();
        crate::memory::sqlite::run_migration(&pool).await.unwrap();
        (SqliteStore::new(pool), dir)
    }

    fn session(id: &str) -> ConversationSession {
        let now = Utc::now();
        ConversationSession {
            session_id: id.to_string(),
            user_id: "user-1".to_string(),
            persona: PersonaEngine::new().default_state(Archetype::Gentle),
            created_at: now,
            updated_at: now,
            active: true,
        }
    }

    #[tokio::test]
    async fn session_round_trips_with_persona() {
        let (store, _dir) = store().await;
        store.upsert_session(&session("s1")).await.unwrap();

        let loaded = store.get_session("s1").await.unwrap().unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.persona.archetype, Archetype::Gentle);
        assert!(loaded.persona.traits.contains_key("warmth"));
        assert!(loaded.active);
    }

    #[tokio::test]
    async fn upsert_persists_the_active_flag() {
        let (store, _dir) = store().await;
        let mut s = session("s1");
        store.upsert_session(&s).await.unwrap();

        s.active = false;
        store.upsert_session(&s).await.unwrap();
        assert!(!store.get_session("s1").await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let (store, _dir) = store().await;
        assert!(store.get_session("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn recent_messages_come_back_chronological() {
        let (store, _dir) = store().await;
        store.upsert_session(&session("s1")).await.unwrap();

        for i in 0..5 {
            let msg = ConversationMessage::user("s1", &format!("msg{i}"), EmotionKind::Neutral);
            store.append_message(&msg).await.unwrap();
        }

        let recent = store.recent_messages("s1", 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "msg2");
        assert_eq!(recent[2].content, "msg4");
    }

    #[tokio::test]
    async fn emotion_counts_group_and_sort() {
        let (store, _dir) = store().await;
        for emotion in [EmotionKind::Joy, EmotionKind::Joy, EmotionKind::Sadness] {
            let msg = ConversationMessage::user("s1", "x", emotion);
            store.append_message(&msg).await.unwrap();
        }
        store
            .append_message(&ConversationMessage::assistant("s1", "reply"))
            .await
            .unwrap();

        assert_eq!(store.message_count("s1").await.unwrap(), 4);

        let counts = store.emotion_counts("s1").await.unwrap();
        assert_eq!(counts[0], ("joy".to_string(), 2));
        assert_eq!(counts[1], ("sadness".to_string(), 1));
    }

    #[tokio::test]
    async fn profile_round_trips() {
        let (store, _dir) = store().await;
        assert!(store.load_profile().await.unwrap().is_none());

        let profile = BotProfile::from_config(&crate::config::AmagiConfig::from_env());
        store.save_profile(&profile).await.unwrap();

        let loaded = store.load_profile().await.unwrap().unwrap();
        assert_eq!(loaded.name, profile.name);
        assert_eq!(loaded.archetype, profile.archetype);
    }

    #[tokio::test]
    async fn worldview_replace_is_atomic_per_user() {
        let (store, _dir) = store().await;
        let records = vec![WorldviewRecord::new(
            "user-1",
            WorldviewCategory::Taboos,
            vec!["背叛".to_string()],
            1.0,
        )];
        store.replace_worldview("user-1", &records).await.unwrap();

        let loaded = store.load_worldview("user-1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].keywords, vec!["背叛"]);

        // Replacing with empty clears only this user.
        store.replace_worldview("user-1", &[]).await.unwrap();
        assert!(store.load_worldview("user-1").await.unwrap().is_empty());
    }
}
