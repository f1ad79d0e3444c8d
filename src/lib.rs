// src/lib.rs

pub mod api;
pub mod chat;
pub mod config;
pub mod emotion;
pub mod knowledge;
pub mod llm;
pub mod memory;
pub mod persona;
pub mod prompt;
pub mod worldview;
