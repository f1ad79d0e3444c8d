//! Qdrant-backed knowledge store over its REST API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::config::AmagiConfig;
use crate::knowledge::{EmbeddingsClient, KnowledgeStore, RecalledMemory};

pub struct QdrantKnowledgeStore {
    client: Client,
    base_url: String,
    collection: String,
    embedding_dim: usize,
    embeddings: EmbeddingsClient,
}

impl QdrantKnowledgeStore {
    pub fn new(config: &AmagiConfig, embeddings: EmbeddingsClient) -> Self {
        Self {
            client: Client::new(),
            base_url: config.qdrant_url.clone(),
            collection: config.qdrant_collection.clone(),
            embedding_dim: config.embedding_dim,
            embeddings,
        }
    }

    /// Create the collection if missing. Safe to call repeatedly.
    pub async fn ensure_collection(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);

        let resp = self.client.get(&url).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }

        let resp = self
            .client
            .put(&url)
            .json(&json!({
                "vectors": { "size": self.embedding_dim, "distance": "Cosine" }
            }))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if status.is_success() || status.as_u16() == 409 || body.contains("already exists") {
            info!(collection = %self.collection, "qdrant collection ready");
            Ok(())
        } else {
            Err(anyhow!("failed to create qdrant collection: {body}"))
        }
    }

    // Unix millis plus nanosecond jitter keeps same-millisecond points apart.
    fn gen_point_id() -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        (now.as_millis() as i64) * 1000 + (now.as_nanos() % 1000) as i64
    }

    async fn upsert_point(
        &self,
        user_id: &str,
        session_id: &str,
        role: &str,
        content: &str,
        emotion_tag: &str,
    ) -> Result<()> {
        let embedding = self.embeddings.embed(content).await?;

        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection
        );
        let body = json!({
            "points": [{
                "id": Self::gen_point_id(),
                "vector": embedding,
                "payload": {
                    "user_id": user_id,
                    "session_id": session_id,
                    "role": role,
                    "content": content,
                    "emotion": emotion_tag,
                    "timestamp": Utc::now().timestamp_millis(),
                }
            }]
        });

        let resp = self.client.put(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!(
                "qdrant upsert failed: {}",
                resp.text().await.unwrap_or_default()
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl KnowledgeStore for QdrantKnowledgeStore {
    async fn index_turn(
        &self,
        user_id: &str,
        session_id: &str,
        user_text: &str,
        assistant_text: &str,
        emotion_tag: &str,
    ) -> Result<()> {
        self.upsert_point(user_id, session_id, "user", user_text, emotion_tag)
            .await?;
        self.upsert_point(user_id, session_id, "assistant", assistant_text, "")
            .await?;
        debug!(user_id, session_id, "turn indexed");
        Ok(())
    }

    async fn search_relevant(
        &self,
        query: &str,
        user_id: &str,
        top_n: usize,
    ) -> Result<Vec<RecalledMemory>> {
        let embedding = self.embeddings.embed(query).await?;

        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let body = json!({
            "vector": embedding,
            "limit": top_n,
            "with_payload": true,
            "filter": {
                "must": [{ "key": "user_id", "match": { "value": user_id } }]
            }
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!(
                "qdrant search failed: {}",
                resp.text().await.unwrap_or_default()
            ));
        }

        let parsed: serde_json::Value = resp.json().await?;
        let mut memories = Vec::new();
        if let Some(points) = parsed.get("result").and_then(|r| r.as_array()) {
            for point in points {
                let content = point["payload"]["content"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let similarity = point["score"].as_f64().unwrap_or(0.0);
                if !content.is_empty() {
                    memories.push(RecalledMemory { content, similarity });
                }
            }
        }
        Ok(memories)
    }
}
