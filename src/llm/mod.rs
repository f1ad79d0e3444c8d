// src/llm/mod.rs
// Completion-provider abstraction: shared request/response types, the
// provider trait, a factory keyed by provider name, and the
// thinking-trace helpers shared by the HTTP providers.

pub mod deepseek;
pub mod mock;
pub mod siliconflow;
pub mod thinking;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::AmagiConfig;

pub use deepseek::DeepSeekProvider;
pub use mock::MockProvider;
pub use siliconflow::SiliconFlowProvider;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// One entry of the ordered message list sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub enable_thinking: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            enable_thinking: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub text: String,
    pub thinking_steps: Option<Vec<String>>,
    pub usage: Option<serde_json::Value>,
    pub model_used: String,
}

/// Provider failures stay distinguishable so the API layer can map auth
/// problems and transport problems to different responses.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} api key is not configured")]
    MissingApiKey { provider: &'static str },

    #[error("unknown llm provider: {0}")]
    UnknownProvider(String),

    #[error("{provider} rejected the credentials")]
    Auth { provider: &'static str },

    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} response missing expected fields")]
    MalformedResponse { provider: &'static str },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// The completion seam. The orchestrator owns message ordering and
/// temperature; providers own transport and model selection.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn available_models(&self) -> Vec<String>;

    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionOutcome, ProviderError>;
}

/// Build a provider by name, defaulting to the configured provider.
pub fn create_provider(
    config: &AmagiConfig,
    provider: Option<&str>,
) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    let name = provider
        .unwrap_or(&config.default_provider)
        .to_lowercase();

    match name.as_str() {
        "deepseek" => {
            let api_key = config
                .deepseek_api_key
                .clone()
                .ok_or(ProviderError::MissingApiKey { provider: "deepseek" })?;
            info!("creating deepseek provider");
            Ok(Arc::new(DeepSeekProvider::new(
                api_key,
                config.deepseek_base_url.clone(),
                config.deepseek_default_model.clone(),
            )))
        }
        "siliconflow" => {
            let api_key = config
                .siliconflow_api_key
                .clone()
                .ok_or(ProviderError::MissingApiKey { provider: "siliconflow" })?;
            info!("creating siliconflow provider");
            Ok(Arc::new(SiliconFlowProvider::new(
                api_key,
                config.siliconflow_base_url.clone(),
                config.siliconflow_default_model.clone(),
            )))
        }
        "mock" => Ok(Arc::new(MockProvider::new())),
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

/// Providers usable with the current configuration; mock is always there.
pub fn available_providers(config: &AmagiConfig) -> Vec<&'static str> {
    let mut providers = Vec::new();
    if config.deepseek_api_key.is_some() {
        providers.push("deepseek");
    }
    if config.siliconflow_api_key.is_some() {
        providers.push("siliconflow");
    }
    providers.push("mock");
    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_name_errors() {
        let config = AmagiConfig::from_env();
        assert!(matches!(
            create_provider(&config, Some("quantum")),
            Err(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn mock_is_always_available() {
        let config = AmagiConfig::from_env();
        assert!(available_providers(&config).contains(&"mock"));
    }

    #[test]
    fn deepseek_without_key_is_missing_api_key() {
        let mut config = AmagiConfig::from_env();
        config.deepseek_api_key = None;
        assert!(matches!(
            create_provider(&config, Some("deepseek")),
            Err(ProviderError::MissingApiKey { provider: "deepseek" })
        ));
    }
}
