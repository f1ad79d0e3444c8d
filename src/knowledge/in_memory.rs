//! Network-free knowledge store. Similarity is character-overlap, which
//! is crude but deterministic; good enough for tests and offline runs.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::knowledge::{KnowledgeStore, RecalledMemory};

#[derive(Debug, Clone)]
struct IndexedEntry {
    user_id: String,
    content: String,
}

#[derive(Debug, Default)]
pub struct InMemoryKnowledgeStore {
    entries: Mutex<Vec<IndexedEntry>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of the query's distinct characters present in the entry.
    fn similarity(query: &str, content: &str) -> f64 {
        let query_chars: HashSet<char> = query.chars().filter(|c| !c.is_whitespace()).collect();
        if query_chars.is_empty() {
            return 0.0;
        }
        let content_chars: HashSet<char> = content.chars().collect();
        let shared = query_chars.intersection(&content_chars).count();
        shared as f64 / query_chars.len() as f64
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn index_turn(
        &self,
        user_id: &str,
        _session_id: &str,
        user_text: &str,
        assistant_text: &str,
        _emotion_tag: &str,
    ) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.push(IndexedEntry {
            user_id: user_id.to_string(),
            content: user_text.to_string(),
        });
        entries.push(IndexedEntry {
            user_id: user_id.to_string(),
            content: assistant_text.to_string(),
        });
        Ok(())
    }

    async fn search_relevant(
        &self,
        query: &str,
        user_id: &str,
        top_n: usize,
    ) -> Result<Vec<RecalledMemory>> {
        let entries = self.entries.lock().unwrap();
        let mut scored: Vec<RecalledMemory> = entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| RecalledMemory {
                content: e.content.clone(),
                similarity: Self::similarity(query, &e.content),
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(top_n);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recall_prefers_overlapping_content() {
        let store = InMemoryKnowledgeStore::new();
        store
            .index_turn("u1", "s1", "我喜欢看星星", "星星很美呢", "joy")
            .await
            .unwrap();
        store
            .index_turn("u1", "s1", "午饭吃什么", "吃拉面吧", "neutral")
            .await
            .unwrap();

        let results = store.search_relevant("星星", "u1", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].content.contains("星星"));
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn recall_is_scoped_to_user() {
        let store = InMemoryKnowledgeStore::new();
        store
            .index_turn("u1", "s1", "秘密话题", "好的", "neutral")
            .await
            .unwrap();
        let results = store.search_relevant("秘密", "u2", 3).await.unwrap();
        assert!(results.is_empty());
    }
}
