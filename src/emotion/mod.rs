// src/emotion/mod.rs

pub mod analyzer;

pub use analyzer::{EmotionAnalyzer, EmotionKind, EmotionResult};
