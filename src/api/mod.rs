// src/api/mod.rs
// HTTP surface: router, handlers, and the shared error type.

pub mod error;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{router, AppState};
