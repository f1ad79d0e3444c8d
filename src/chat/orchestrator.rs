//! The per-turn dialogue pipeline.
//!
//! Fourteen fixed steps: classify emotion, resolve the session, drift the
//! persona, recall memories, load context/profile/worldview, assemble the
//! prompt, call the provider, persist both turn halves, index the turn,
//! compose the response. Failures propagate as-is; side effects already
//! committed (notably the persona update in step 3) are never rolled back.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::types::{
    ChatTurnRequest, ChatTurnResponse, EmotionPayload, PersonaPayload, ProfileUpdate,
    ProviderModels, SessionSummary, TurnMetadata, WorldviewCategoryUpdate,
};
use crate::config::AmagiConfig;
use crate::emotion::EmotionAnalyzer;
use crate::knowledge::KnowledgeStore;
use crate::llm::{self, ChatMessage, CompletionProvider, CompletionRequest};
use crate::memory::{
    BotProfile, ConversationMessage, ConversationSession, ProfileStore, SessionStore,
};
use crate::persona::{Archetype, PersonaEngine};
use crate::prompt::{MemorySnippet, PromptBuilder, PromptContext};
use crate::worldview::{WorldviewCategory, WorldviewRecord, WorldviewScorer, WorldviewSummary};

/// Recalled memories are echoed in responses as previews of this length.
const RESPONSE_PREVIEW_CHARS: usize = 100;

/// Coarse topic buckets for the prompt's context block.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("问候", &["你好", "您好", "hi", "hello", "早上好", "晚上好"]),
    ("询问", &["什么", "怎么", "为什么", "如何", "哪里", "谁"]),
    ("情感", &["开心", "难过", "生气", "担心", "兴奋", "紧张"]),
    ("日常", &["吃饭", "睡觉", "工作", "学习", "休息"]),
    ("帮助", &["帮助", "帮忙", "协助", "支持"]),
    ("聊天", &["聊天", "说话", "交流", "谈话"]),
];

pub struct ChatOrchestrator {
    config: AmagiConfig,
    analyzer: EmotionAnalyzer,
    engine: PersonaEngine,
    scorer: WorldviewScorer,
    builder: PromptBuilder,
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
    knowledge: Arc<dyn KnowledgeStore>,
}

impl ChatOrchestrator {
    pub fn new(
        config: AmagiConfig,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
        knowledge: Arc<dyn KnowledgeStore>,
    ) -> Self {
        let builder = PromptBuilder::new(&config);
        Self {
            config,
            analyzer: EmotionAnalyzer::new(),
            engine: PersonaEngine::new(),
            scorer: WorldviewScorer::new(),
            builder,
            sessions,
            profiles,
            knowledge,
        }
    }

    pub async fn chat_turn(&self, request: ChatTurnRequest) -> Result<ChatTurnResponse> {
        // 1. Classify the incoming message.
        let emotion = self.analyzer.analyze(&request.message);
        info!(emotion = %emotion.emotion, confidence = emotion.confidence, "emotion classified");

        // 2. Resolve or create the session. A session id owned by a
        // different user is never adopted; the turn starts fresh instead.
        let mut session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let existing = match self.sessions.get_session(&session_id).await? {
            Some(session) if session.user_id == request.user_id => Some(session),
            Some(_) => {
                warn!(%session_id, user_id = %request.user_id, "session belongs to another user, starting a new one");
                session_id = Uuid::new_v4().to_string();
                None
            }
            None => None,
        };
        let session = match existing {
            Some(session) => session,
            None => {
                let archetype = self.resolve_archetype(request.archetype.as_deref());
                let now = chrono::Utc::now();
                let session = ConversationSession {
                    session_id: session_id.clone(),
                    user_id: request.user_id.clone(),
                    persona: self.engine.default_state(archetype),
                    created_at: now,
                    updated_at: now,
                    active: true,
                };
                self.sessions.upsert_session(&session).await?;
                info!(%session_id, %archetype, "session created");
                session
            }
        };

        // 3. Drift the persona and persist it unconditionally. A provider
        // failure later in the turn keeps this update.
        let persona = self
            .engine
            .adjust(&session.persona, emotion.emotion, emotion.confidence);
        let updated_session = ConversationSession {
            persona: persona.clone(),
            updated_at: chrono::Utc::now(),
            ..session
        };
        self.sessions.upsert_session(&updated_session).await?;

        // 4. Recall semantically relevant memories above the threshold.
        let relevant_memories: Vec<_> = self
            .knowledge
            .search_relevant(&request.message, &request.user_id, self.config.memory_top_n)
            .await?
            .into_iter()
            .filter(|m| m.similarity > self.config.memory_similarity_threshold)
            .collect();

        // 5. Recent conversation context; only the tail is used downstream.
        let context_messages = self
            .sessions
            .recent_messages(&session_id, self.config.context_fetch_limit)
            .await?;

        // 6. Bot profile, seeded from config on first use.
        let profile = self.get_or_create_profile().await?;

        // 7. Worldview records, bootstrapped from config defaults per user.
        let records = self.get_or_create_worldview(&request.user_id).await?;

        // 8. Score worldview influence for this message.
        let worldview = self.scorer.analyze(&request.message, &records);

        // 9. Assemble the system prompt.
        let prompt_context = PromptContext {
            user_mood: Some(emotion.description.clone()),
            bot_mood: Some(persona.mood),
            topic: Some(extract_topic(&request.message).to_string()),
            recent_memories: relevant_memories
                .iter()
                .map(|m| MemorySnippet {
                    preview: m.content.clone(),
                    similarity: m.similarity,
                })
                .collect(),
            main_traits: persona.main_traits(),
            worldview: Some(worldview.clone()),
        };
        let system_prompt = self.builder.build(&profile, &prompt_context);

        // 10. Ordered message list: system, recent turns, current message.
        let mut messages = vec![ChatMessage::system(system_prompt)];
        let used = context_messages
            .len()
            .saturating_sub(self.config.context_used_limit);
        for ctx in &context_messages[used..] {
            messages.push(ChatMessage {
                role: ctx.role.as_str().to_string(),
                content: ctx.content.clone(),
            });
        }
        messages.push(ChatMessage::user(request.message.clone()));

        // 11. Provider call at the fixed temperature.
        let provider = self.resolve_provider(request.provider_hint.as_deref())?;
        let outcome = provider
            .complete(CompletionRequest {
                messages,
                model: request.model_hint.clone(),
                temperature: llm::DEFAULT_TEMPERATURE,
                max_tokens: llm::DEFAULT_MAX_TOKENS,
                enable_thinking: request.enable_thinking,
            })
            .await
            .map_err(|e| anyhow!(e))?;

        // 12. Persist both halves of the turn.
        self.sessions
            .append_message(&ConversationMessage::user(
                &session_id,
                &request.message,
                emotion.emotion,
            ))
            .await?;
        self.sessions
            .append_message(&ConversationMessage::assistant(&session_id, &outcome.text))
            .await?;

        // 13. Index the turn for later recall.
        self.knowledge
            .index_turn(
                &request.user_id,
                &session_id,
                &request.message,
                &outcome.text,
                emotion.emotion.as_str(),
            )
            .await?;

        // 14. Compose the response, reply suffixed with the emotion marker.
        info!(%session_id, "chat turn complete");
        Ok(ChatTurnResponse {
            reply_text: format!("{} {}", outcome.text, emotion.marker),
            session_id,
            thinking_steps: outcome.thinking_steps,
            emotion: EmotionPayload::from(&emotion),
            persona: PersonaPayload::from(&persona),
            relevant_memories: relevant_memories
                .iter()
                .map(|m| MemorySnippet::preview_of(&m.content, m.similarity, RESPONSE_PREVIEW_CHARS))
                .collect(),
            worldview_influence: worldview,
            metadata: TurnMetadata {
                model_used: outcome.model_used,
                usage: outcome.usage,
                bot_name: profile.name,
                bot_archetype: profile.archetype,
                processed_at: chrono::Utc::now(),
            },
        })
    }

    /// None for a session that does not exist.
    pub async fn session_summary(&self, session_id: &str) -> Result<Option<SessionSummary>> {
        let Some(session) = self.sessions.get_session(session_id).await? else {
            return Ok(None);
        };
        let message_count = self.sessions.message_count(session_id).await?;
        let emotion_distribution = self.sessions.emotion_counts(session_id).await?;

        Ok(Some(SessionSummary {
            session_id: session.session_id,
            user_id: session.user_id,
            created_at: session.created_at,
            updated_at: session.updated_at,
            message_count,
            active: session.active,
            current_persona: PersonaPayload::from(&session.persona),
            emotion_distribution,
        }))
    }

    /// Replace the session's persona with a fresh default state. Returns
    /// the new state, or None if the session does not exist.
    pub async fn reset_persona(
        &self,
        session_id: &str,
        archetype: Option<&str>,
    ) -> Result<Option<PersonaPayload>> {
        let Some(session) = self.sessions.get_session(session_id).await? else {
            return Ok(None);
        };

        let archetype = self.resolve_archetype(archetype);
        let persona = self.engine.default_state(archetype);
        let updated = ConversationSession {
            persona: persona.clone(),
            updated_at: chrono::Utc::now(),
            ..session
        };
        self.sessions.upsert_session(&updated).await?;
        info!(%session_id, %archetype, "persona reset");
        Ok(Some(PersonaPayload::from(&persona)))
    }

    pub fn available_personalities(&self) -> Vec<&'static str> {
        Archetype::ALL.iter().map(|a| a.as_str()).collect()
    }

    pub fn available_providers(&self) -> Vec<&'static str> {
        llm::available_providers(&self.config)
    }

    /// Model catalogs for every provider usable with this configuration.
    pub fn available_models(&self) -> Vec<ProviderModels> {
        self.available_providers()
            .into_iter()
            .filter_map(|name| self.provider_models(name).ok())
            .collect()
    }

    pub fn provider_models(&self, provider: &str) -> Result<ProviderModels> {
        let resolved = llm::create_provider(&self.config, Some(provider)).map_err(|e| anyhow!(e))?;
        let models = resolved.available_models();
        let default_model = match resolved.name() {
            "deepseek" => Some(self.config.deepseek_default_model.clone()),
            "siliconflow" => Some(self.config.siliconflow_default_model.clone()),
            _ => models.first().cloned(),
        };
        Ok(ProviderModels {
            provider: resolved.name(),
            models,
            default_model,
        })
    }

    pub async fn get_or_create_profile(&self) -> Result<BotProfile> {
        match self.profiles.load_profile().await? {
            Some(profile) => Ok(profile),
            None => {
                let profile = BotProfile::from_config(&self.config);
                self.profiles.save_profile(&profile).await?;
                Ok(profile)
            }
        }
    }

    /// Apply a partial profile update. Unknown archetype tags keep the
    /// current value.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<BotProfile> {
        let mut profile = self.get_or_create_profile().await?;

        if let Some(name) = update.name {
            profile.name = name;
        }
        if let Some(description) = update.description {
            profile.description = description;
        }
        if let Some(archetype) = update.archetype {
            match archetype.parse() {
                Ok(parsed) => profile.archetype = parsed,
                Err(()) => warn!(%archetype, "unknown archetype in profile update, keeping current"),
            }
        }
        if let Some(background) = update.background {
            profile.background = background;
        }
        if let Some(stylized) = update.use_stylized_speech {
            profile.speaking_style.use_stylized_speech = stylized;
        }
        if let Some(level) = update.formality_level {
            profile.speaking_style.formality_level = level.clamp(0.0, 1.0);
        }
        if let Some(level) = update.enthusiasm_level {
            profile.speaking_style.enthusiasm_level = level.clamp(0.0, 1.0);
        }
        if let Some(level) = update.cuteness_level {
            profile.speaking_style.cuteness_level = level.clamp(0.0, 1.0);
        }
        profile.updated_at = chrono::Utc::now();

        self.profiles.save_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn worldview_summary(&self, user_id: &str) -> Result<WorldviewSummary> {
        let records = self.get_or_create_worldview(user_id).await?;
        Ok(self.scorer.summarize(&records))
    }

    /// Update one category's keywords. An unknown category name falls
    /// back to the taboos bucket after a warning.
    pub async fn update_worldview_category(
        &self,
        user_id: &str,
        update: WorldviewCategoryUpdate,
    ) -> Result<()> {
        let category = match update.category.parse::<WorldviewCategory>() {
            Ok(category) => category,
            Err(()) => {
                warn!(category = %update.category, "unknown worldview category, using taboos");
                WorldviewCategory::Taboos
            }
        };

        let mut records = self.get_or_create_worldview(user_id).await?;
        if let Some(record) = records.iter_mut().find(|r| r.category == category) {
            record.keywords = update.keywords;
            record.weight = update.weight.clamp(0.0, 1.0);
            record.updated_at = chrono::Utc::now();
        } else {
            records.push(WorldviewRecord::new(
                user_id,
                category,
                update.keywords,
                update.weight,
            ));
        }
        self.profiles.replace_worldview(user_id, &records).await
    }

    /// Drop the user's records and re-seed from config defaults.
    pub async fn reset_worldview(&self, user_id: &str) -> Result<WorldviewSummary> {
        let records = self.scorer.default_records(user_id, &self.config);
        self.profiles.replace_worldview(user_id, &records).await?;
        Ok(self.scorer.summarize(&records))
    }

    async fn get_or_create_worldview(&self, user_id: &str) -> Result<Vec<WorldviewRecord>> {
        let existing = self.profiles.load_worldview(user_id).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }
        let records = self.scorer.default_records(user_id, &self.config);
        self.profiles.replace_worldview(user_id, &records).await?;
        Ok(records)
    }

    fn resolve_archetype(&self, requested: Option<&str>) -> Archetype {
        match requested {
            Some(tag) => tag.parse().unwrap_or_else(|()| {
                warn!(archetype = tag, "unknown archetype, using default");
                Archetype::default()
            }),
            None => self
                .config
                .default_bot_archetype
                .parse()
                .unwrap_or_default(),
        }
    }

    fn resolve_provider(
        &self,
        hint: Option<&str>,
    ) -> Result<Arc<dyn CompletionProvider>> {
        llm::create_provider(&self.config, hint).map_err(|e| anyhow!(e))
    }
}

fn extract_topic(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    for (topic, words) in TOPIC_KEYWORDS {
        if words.iter().any(|w| lower.contains(w)) {
            return topic;
        }
    }
    "一般对话"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_extraction_matches_first_bucket() {
        assert_eq!(extract_topic("你好呀"), "问候");
        assert_eq!(extract_topic("工作好累"), "日常");
        assert_eq!(extract_topic("嗯"), "一般对话");
    }
}
