// src/memory/sqlite/mod.rs

pub mod migration;
pub mod store;

pub use migration::run_migration;
pub use store::SqliteStore;
