//! Embeddings over the SiliconFlow OpenAI-compatible endpoint.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::AmagiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub struct EmbeddingsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl EmbeddingsClient {
    pub fn new(config: &AmagiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.siliconflow_base_url.clone(),
            api_key: config.siliconflow_api_key.clone(),
            model: config.embedding_model.clone(),
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("embeddings require a siliconflow api key"))?;

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({ "model": self.model, "input": text }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("embedding request failed ({status}): {body}"));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedding response had no data"))?
            .embedding;

        debug!(dim = embedding.len(), "embedded text");
        Ok(embedding)
    }
}
