// src/prompt/mod.rs
// Deterministic system-prompt assembly from profile, persona and context.

pub mod builder;

pub use builder::{MemorySnippet, PromptBuilder, PromptContext};
