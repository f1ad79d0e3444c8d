// src/chat/mod.rs
// The per-turn dialogue pipeline and its request/response payloads.

pub mod orchestrator;
pub mod types;

pub use orchestrator::ChatOrchestrator;
pub use types::{
    ChatTurnRequest, ChatTurnResponse, EmotionPayload, PersonaPayload, ProfileUpdate,
    ProviderModels, SessionSummary, TurnMetadata, WorldviewCategoryUpdate,
};
