//! Chat-turn wire payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::emotion::{EmotionKind, EmotionResult};
use crate::persona::{Archetype, Mood, PersonaState};
use crate::prompt::MemorySnippet;
use crate::worldview::WorldviewInfluence;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    pub message: String,
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Archetype for a newly created session; ignored on existing ones.
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub provider_hint: Option<String>,
    #[serde(default)]
    pub model_hint: Option<String>,
    #[serde(default)]
    pub enable_thinking: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionPayload {
    pub kind: EmotionKind,
    pub confidence: f64,
    pub marker: String,
    pub description: String,
}

impl From<&EmotionResult> for EmotionPayload {
    fn from(result: &EmotionResult) -> Self {
        Self {
            kind: result.emotion,
            confidence: result.confidence,
            marker: result.marker.clone(),
            description: result.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaPayload {
    pub archetype: Archetype,
    pub mood: Mood,
    pub energy: f64,
    pub main_traits: BTreeMap<String, f64>,
}

impl From<&PersonaState> for PersonaPayload {
    fn from(state: &PersonaState) -> Self {
        Self {
            archetype: state.archetype,
            mood: state.mood,
            energy: state.energy,
            main_traits: state.main_traits(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnMetadata {
    pub model_used: String,
    pub usage: Option<serde_json::Value>,
    pub bot_name: String,
    pub bot_archetype: Archetype,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnResponse {
    pub reply_text: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_steps: Option<Vec<String>>,
    pub emotion: EmotionPayload,
    pub persona: PersonaPayload,
    /// Recalled memories in preview form, never the full stored content.
    pub relevant_memories: Vec<MemorySnippet>,
    pub worldview_influence: WorldviewInfluence,
    pub metadata: TurnMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u64,
    pub active: bool,
    pub current_persona: PersonaPayload,
    /// Emotion tag to message count, most frequent first.
    pub emotion_distribution: Vec<(String, u64)>,
}

/// One provider's model catalog for the models endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderModels {
    pub provider: &'static str,
    pub models: Vec<String>,
    pub default_model: Option<String>,
}

/// Partial bot-profile update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub archetype: Option<String>,
    pub background: Option<String>,
    pub use_stylized_speech: Option<bool>,
    pub formality_level: Option<f64>,
    pub enthusiasm_level: Option<f64>,
    pub cuteness_level: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldviewCategoryUpdate {
    pub category: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}
