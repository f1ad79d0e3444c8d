//! SiliconFlow provider. Same OpenAI-compatible wire format as DeepSeek
//! but with a curated model catalog; unknown model hints fall back to the
//! configured default rather than failing the turn.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::llm::thinking::{inject_thinking_prompt, split_thinking};
use crate::llm::{CompletionOutcome, CompletionProvider, CompletionRequest, ProviderError};

const PROVIDER: &str = "siliconflow";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SUPPORTED_MODELS: &[&str] = &[
    "Qwen/Qwen2.5-7B-Instruct",
    "Qwen/Qwen2.5-14B-Instruct",
    "Qwen/Qwen2.5-32B-Instruct",
    "Qwen/Qwen2.5-72B-Instruct",
    "Qwen/Qwen3-235B-A22B",
    "meta-llama/Meta-Llama-3.1-8B-Instruct",
    "meta-llama/Meta-Llama-3.1-70B-Instruct",
    "meta-llama/Meta-Llama-3.1-405B-Instruct",
    "deepseek-ai/DeepSeek-V2.5",
    "deepseek-ai/deepseek-llm-67b-chat",
    "01-ai/Yi-1.5-34B-Chat",
    "THUDM/glm-4-9b-chat",
    "internlm/internlm2_5-7b-chat",
];

pub struct SiliconFlowProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl SiliconFlowProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            default_model,
        }
    }

    fn resolve_model(&self, hint: Option<&str>) -> String {
        match hint {
            Some(model) if SUPPORTED_MODELS.contains(&model) => model.to_string(),
            Some(model) => {
                warn!(%model, default = %self.default_model, "unsupported model hint, using default");
                self.default_model.clone()
            }
            None => self.default_model.clone(),
        }
    }
}

#[async_trait]
impl CompletionProvider for SiliconFlowProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn available_models(&self) -> Vec<String> {
        SUPPORTED_MODELS.iter().map(|m| m.to_string()).collect()
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, ProviderError> {
        let model = self.resolve_model(request.model.as_deref());

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
            error!(%status, "siliconflow auth failure");
            return Err(ProviderError::Auth { provider: PROVIDER });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%status, %message, "siliconflow api failure");
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

        info!(%model, "siliconflow completion succeeded");

        Ok(CompletionOutcome {
            text,
            thinking_steps,
            usage: body.get("usage").cloned(),
            model_used: model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SiliconFlowProvider {
        SiliconFlowProvider::new(
            "key".to_string(),
            "http://localhost".to_string(),
            "Qwen/Qwen2.5-7B-Instruct".to_string(),
        )
    }

    #[test]
    fn unknown_model_hint_falls_back_to_default() {
        assert_eq!(
            provider().resolve_model(Some("made-up/model")),
            "Qwen/Qwen2.5-7B-Instruct"
        );
    }

    #[test]
    fn supported_model_hint_is_kept() {
        assert_eq!(
            provider().resolve_model(Some("THUDM/glm-4-9b-chat")),
            "THUDM/glm-4-9b-chat"
        );
    }
}
