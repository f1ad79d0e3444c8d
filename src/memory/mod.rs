// src/memory/mod.rs
// Conversation persistence: session state, message history, bot profile
// and per-user worldview records, all behind async store traits.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStore;
pub use traits::{ProfileStore, SessionStore};
pub use types::{
    BotAppearance, BotPreferences, BotProfile, ConversationMessage, ConversationSession,
    MessageRole, SpeakingStyle, SpecialSettings,
};
