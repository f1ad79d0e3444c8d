//! DeepSeek chat-completions provider (OpenAI-compatible wire format).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};

use crate::llm::thinking::{inject_thinking_prompt, split_thinking};
use crate::llm::{CompletionOutcome, CompletionProvider, CompletionRequest, ProviderError};

const PROVIDER: &str = "deepseek";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct DeepSeekProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl DeepSeekProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            default_model,
        }
    }
}

#[async_trait]
impl CompletionProvider for DeepSeekProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn available_models(&self) -> Vec<String> {
        vec!["deepseek-chat".to_string(), "deepseek-coder".to_string()]
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let messages = if request.enable_thinking {
            inject_thinking_prompt(request.messages)
        } else {
            request.messages
        };

        let payload = json!({
            "model": model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!(%status, "deepseek auth failure");
            return Err(ProviderError::Auth { provider: PROVIDER });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%status, %message, "deepseek api failure");
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(ProviderError::MalformedResponse { provider: PROVIDER })?
            .to_string();

        let (text, thinking_steps) = if request.enable_thinking {
            split_thinking(&content)
        } else {
            (content, None)
        };

        info!(%model, "deepseek completion succeeded");

        Ok(CompletionOutcome {
            text,
            thinking_steps,
            usage: body.get("usage").cloned(),
            model_used: model,
        })
    }
}
