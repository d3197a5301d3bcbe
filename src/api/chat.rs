use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::middleware::model_access::authorize;
use crate::models::application::ApplicationInfo;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::AppState;

/// POST /api/chat — guard the application key, then dispatch to its backend.
#[tracing::instrument(skip(state, req), fields(model = %req.model, messages = req.messages.len()))]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let app = authorize(&state.registry, &req.app_key, &req.model).await?;
    let response = state.dispatcher.chat(&app, &req.model, &req.messages).await?;
    Ok(Json(ChatResponse { response }))
}

/// GET /api/apps/:key — name and welcome message for an active application.
pub async fn app_info(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ApplicationInfo>, AppError> {
    let app = state.registry.get(&key).await?;
    if !app.active {
        return Err(AppError::Forbidden);
    }
    Ok(Json(ApplicationInfo::from(&app)))
}
