//! Persistent conversation and profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::AmagiConfig;
use crate::emotion::EmotionKind;
use crate::persona::{Archetype, PersonaState};

/// Who authored a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Stored role strings are trusted but parsed defensively anyway.
impl FromStr for MessageRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        })
    }
}

/// One persisted conversation turn half.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Option<i64>,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    /// The emotion read off a user message; assistant messages carry none.
    pub emotion: Option<EmotionKind>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(session_id: &str, content: &str, emotion: EmotionKind) -> Self {
        Self {
            id: None,
            session_id: session_id.to_string(),
            role: MessageRole::User,
            content: content.to_string(),
            emotion: Some(emotion),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(session_id: &str, content: &str) -> Self {
        Self {
            id: None,
            session_id: session_id.to_string(),
            role: MessageRole::Assistant,
            content: content.to_string(),
            emotion: None,
            timestamp: Utc::now(),
        }
    }
}

/// Session row: identity plus the full mutable persona snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub user_id: String,
    pub persona: PersonaState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Sessions are never deleted; a closed session just flips this off.
    pub active: bool,
}

/// How stylized the bot's speech is. Sliders live in [0, 1] and feed the
/// prompt builder's low/medium/high breakpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingStyle {
    pub use_stylized_speech: bool,
    pub formality_level: f64,
    pub enthusiasm_level: f64,
    pub cuteness_level: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotAppearance {
    pub species: String,
    pub hair_color: String,
    pub eye_color: String,
    pub outfit: String,
    pub special_features: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotPreferences {
    pub favorite_topics: Vec<String>,
    pub hobbies: Vec<String>,
    pub dislikes: Vec<String>,
}

/// Optional lore extensions; empty lists simply render nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialSettings {
    pub race: String,
    pub special_abilities: Vec<String>,
    pub special_items: Vec<String>,
    pub hidden_background: String,
}

/// The single configurable bot identity. There is one profile per
/// deployment, seeded from config on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotProfile {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub archetype: Archetype,
    pub background: String,
    pub appearance: BotAppearance,
    pub speaking_style: SpeakingStyle,
    pub preferences: BotPreferences,
    pub special_settings: SpecialSettings,
    pub updated_at: DateTime<Utc>,
}

impl BotProfile {
    /// Seed a profile from config defaults. Unknown archetype tags fall
    /// back to the default archetype rather than failing.
    pub fn from_config(config: &AmagiConfig) -> Self {
        Self {
            name: config.default_bot_name.clone(),
            full_name: config.default_bot_full_name.clone(),
            description: config.default_bot_description.clone(),
            archetype: config
                .default_bot_archetype
                .parse()
                .unwrap_or_default(),
            background: config.default_bot_background.clone(),
            appearance: BotAppearance {
                species: config.default_bot_species.clone(),
                hair_color: config.default_bot_hair_color.clone(),
                eye_color: config.default_bot_eye_color.clone(),
                outfit: config.default_bot_outfit.clone(),
                special_features: config.default_bot_special_features.clone(),
            },
            speaking_style: SpeakingStyle {
                use_stylized_speech: config.default_use_stylized_speech,
                formality_level: config.default_formality_level,
                enthusiasm_level: config.default_enthusiasm_level,
                cuteness_level: config.default_cuteness_level,
            },
            preferences: BotPreferences {
                favorite_topics: AmagiConfig::split_list(&config.default_bot_favorite_topics),
                hobbies: AmagiConfig::split_list(&config.default_bot_hobbies),
                dislikes: AmagiConfig::split_list(&config.default_bot_dislikes),
            },
            special_settings: SpecialSettings {
                race: config.default_bot_race.clone(),
                special_abilities: AmagiConfig::split_list(&config.special_abilities),
                special_items: AmagiConfig::split_list(&config.special_items),
                hidden_background: config.hidden_background.clone(),
            },
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_defaults_to_user() {
        assert_eq!("narrator".parse::<MessageRole>(), Ok(MessageRole::User));
        assert_eq!("assistant".parse::<MessageRole>(), Ok(MessageRole::Assistant));
    }

    #[test]
    fn profile_from_config_parses_lists() {
        let config = AmagiConfig::from_env();
        let profile = BotProfile::from_config(&config);
        assert!(!profile.name.is_empty());
        assert!(!profile.preferences.favorite_topics.is_empty());
        assert!((0.0..=1.0).contains(&profile.speaking_style.cuteness_level));
    }

    #[test]
    fn user_message_carries_emotion_assistant_does_not() {
        let user = ConversationMessage::user("s1", "hi", EmotionKind::Joy);
        let bot = ConversationMessage::assistant("s1", "hello");
        assert_eq!(user.emotion, Some(EmotionKind::Joy));
        assert!(bot.emotion.is_none());
    }
}
