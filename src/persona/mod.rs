// src/persona/mod.rs
// Archetype definitions and the continuous persona-state engine.

pub mod archetype;
pub mod engine;

pub use archetype::{Archetype, Mood};
pub use engine::{PersonaEngine, PersonaState};
