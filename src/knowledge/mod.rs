// src/knowledge/mod.rs
// Semantic memory: embed conversation turns, index them in Qdrant, and
// recall the closest snippets for prompt context. An in-memory variant
// backs tests and network-free runs.

pub mod embeddings;
pub mod in_memory;
pub mod qdrant;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use embeddings::EmbeddingsClient;
pub use in_memory::InMemoryKnowledgeStore;
pub use qdrant::QdrantKnowledgeStore;

/// A recalled snippet with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalledMemory {
    pub content: String,
    pub similarity: f64,
}

/// Long-term memory seam. Indexing failures fail the turn; there is no
/// local retry.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Index both halves of a finished turn for the user.
    async fn index_turn(
        &self,
        user_id: &str,
        session_id: &str,
        user_text: &str,
        assistant_text: &str,
        emotion_tag: &str,
    ) -> Result<()>;

    /// Top-N snippets most similar to the query, best first. Similarity
    /// thresholds are the caller's concern.
    async fn search_relevant(
        &self,
        query: &str,
        user_id: &str,
        top_n: usize,
    ) -> Result<Vec<RecalledMemory>>;
}
