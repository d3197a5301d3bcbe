use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AdminSubject;
use crate::backend::ConnectionDescriptor;
use crate::errors::AppError;
use crate::models::application::{
    non_empty, Application, ApplicationPatch, NewApplication, DEFAULT_BINDING,
};
use crate::registry::mask_key;
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

#[derive(Serialize, Deserialize)]
pub struct CreateAppResponse {
    pub status: String,
    pub key: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize)]
pub struct ModelsResponse {
    pub binding: String,
    pub models: Vec<String>,
}

/// Connection settings to probe before an application exists.
#[derive(Deserialize)]
pub struct DiscoverModelsRequest {
    #[serde(default)]
    pub binding: Option<String>,
    #[serde(default)]
    pub host_address: Option<String>,
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default)]
    pub verify_ssl: Option<bool>,
    #[serde(default)]
    pub certificate_file_path: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /admin/login — exchange admin credentials for a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let issued = state.auth.login(&payload.username, &payload.password)?;
    Ok(Json(LoginResponse {
        access_token: issued.access_token,
        token_type: "bearer".to_string(),
        expires_in: state.auth.ttl().num_seconds(),
    }))
}

/// GET /admin/apps — list every application record
pub async fn list_apps(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(state.registry.list().await?))
}

/// POST /admin/apps — register a new application
pub async fn create_app(
    State(state): State<Arc<AppState>>,
    Extension(AdminSubject(admin)): Extension<AdminSubject>,
    Json(payload): Json<NewApplication>,
) -> Result<(StatusCode, Json<CreateAppResponse>), AppError> {
    let key = state.registry.create(payload).await?;
    tracing::info!(admin = %admin, key = %mask_key(&key), "admin created application");

    Ok((
        StatusCode::CREATED,
        Json(CreateAppResponse {
            status: "created".to_string(),
            key,
        }),
    ))
}

/// GET /admin/apps/:key
pub async fn get_app(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Application>, AppError> {
    Ok(Json(state.registry.get(&key).await?))
}

/// PUT /admin/apps/:key — partial update, absent fields are kept
pub async fn update_app(
    State(state): State<Arc<AppState>>,
    Extension(AdminSubject(admin)): Extension<AdminSubject>,
    Path(key): Path<String>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<Json<Application>, AppError> {
    let app = state.registry.update(&key, patch).await?;
    tracing::info!(admin = %admin, key = %mask_key(&key), "admin updated application");
    Ok(Json(app))
}

/// DELETE /admin/apps/:key
pub async fn delete_app(
    State(state): State<Arc<AppState>>,
    Extension(AdminSubject(admin)): Extension<AdminSubject>,
    Path(key): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    state.registry.delete(&key).await?;
    tracing::info!(admin = %admin, key = %mask_key(&key), "admin deleted application");
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

/// GET /admin/apps/:key/models — discover models using a record's connection
pub async fn app_models(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ModelsResponse>, AppError> {
    let app = state.registry.get(&key).await?;
    let conn = ConnectionDescriptor::for_application(&app, None);
    let models = state.dispatcher.list_models(&conn).await?;
    Ok(Json(ModelsResponse {
        binding: conn.binding,
        models,
    }))
}

/// POST /admin/models — discover models for ad-hoc connection settings
pub async fn discover_models(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DiscoverModelsRequest>,
) -> Result<Json<ModelsResponse>, AppError> {
    let conn = ConnectionDescriptor {
        binding: non_empty(payload.binding).unwrap_or_else(|| DEFAULT_BINDING.to_string()),
        host_address: payload.host_address.unwrap_or_default().trim().to_string(),
        service_key: non_empty(payload.service_key),
        verify_ssl: payload.verify_ssl.unwrap_or(true),
        certificate_file_path: non_empty(payload.certificate_file_path),
        model_name: None,
    };
    let models = state.dispatcher.list_models(&conn).await?;
    Ok(Json(ModelsResponse {
        binding: conn.binding,
        models,
    }))
}
