//! Router and handlers. All state hangs off one `AppState` behind an Arc.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::error::{ApiError, ApiResult};
use crate::chat::{
    ChatOrchestrator, ChatTurnRequest, ChatTurnResponse, ProfileUpdate, WorldviewCategoryUpdate,
};

pub struct AppState {
    pub orchestrator: ChatOrchestrator,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/sessions/{session_id}/summary", get(session_summary))
        .route("/sessions/{session_id}/reset-persona", post(reset_persona))
        .route("/personalities", get(personalities))
        .route("/providers", get(providers))
        .route("/models", get(models))
        .route("/models/{provider}", get(provider_models))
        .route("/bot-profile", get(bot_profile).put(update_bot_profile))
        .route("/worldview/{user_id}", get(worldview).put(update_worldview))
        .route("/worldview/{user_id}/reset", post(reset_worldview))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatTurnRequest>,
) -> ApiResult<Json<ChatTurnResponse>> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }
    let response = state.orchestrator.chat_turn(request).await?;
    Ok(Json(response))
}

async fn session_summary(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let summary = state
        .orchestrator
        .session_summary(&session_id)
        .await?
        .ok_or_else(|| ApiError::not_found("session not found"))?;
    Ok(Json(json!(summary)))
}

#[derive(Debug, Deserialize)]
struct ResetPersonaRequest {
    archetype: Option<String>,
}

async fn reset_persona(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<ResetPersonaRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let persona = state
        .orchestrator
        .reset_persona(&session_id, request.archetype.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("session not found"))?;
    Ok(Json(json!({ "persona": persona })))
}

async fn personalities(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "personalities": state.orchestrator.available_personalities() }))
}

async fn providers(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "providers": state.orchestrator.available_providers() }))
}

async fn models(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "models": state.orchestrator.available_models() }))
}

async fn provider_models(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state
        .orchestrator
        .available_providers()
        .contains(&provider.as_str())
    {
        return Err(ApiError::not_found("provider not available"));
    }
    let models = state.orchestrator.provider_models(&provider)?;
    Ok(Json(json!(models)))
}

async fn bot_profile(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let profile = state.orchestrator.get_or_create_profile().await?;
    Ok(Json(json!(profile)))
}

async fn update_bot_profile(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    let profile = state.orchestrator.update_profile(update).await?;
    Ok(Json(json!(profile)))
}

async fn worldview(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let summary = state.orchestrator.worldview_summary(&user_id).await?;
    Ok(Json(json!(summary)))
}

async fn update_worldview(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(update): Json<WorldviewCategoryUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    if update.keywords.is_empty() {
        return Err(ApiError::bad_request("keywords must not be empty"));
    }
    state
        .orchestrator
        .update_worldview_category(&user_id, update)
        .await?;
    let summary = state.orchestrator.worldview_summary(&user_id).await?;
    Ok(Json(json!(summary)))
}

async fn reset_worldview(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let summary = state.orchestrator.reset_worldview(&user_id).await?;
    Ok(Json(json!(summary)))
}
