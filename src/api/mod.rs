use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{AdminSubject, AuthError};
use crate::errors::AppError;
use crate::AppState;

pub mod chat;
pub mod handlers;

/// Build the complete HTTP surface: public chat routes, the admin
/// control surface behind `admin_auth`, and the shared middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    let dashboard_origin = state.config.dashboard_origin.clone();

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/admin", admin_router(state.clone()))
        .route("/api/chat", post(chat::chat))
        .route("/api/apps/:key", get(chat::app_info))
        .fallback(fallback_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(dashboard_origin))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Admin routes, relative to `/admin`. Everything except `/login` requires
/// a session token.
fn admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/apps",
            get(handlers::list_apps).post(handlers::create_app),
        )
        .route(
            "/apps/:key",
            get(handlers::get_app)
                .put(handlers::update_app)
                .delete(handlers::delete_app),
        )
        .route("/apps/:key/models", get(handlers::app_models))
        .route("/models", post(handlers::discover_models))
        .route_layer(middleware::from_fn_with_state(state, admin_auth))
        // Added after route_layer, so not behind admin_auth.
        .route("/login", post(handlers::login))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware: validates `Authorization: Bearer <session token>` and
/// attaches the admin subject to the request.
async fn admin_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        tracing::warn!(path = %req.uri().path(), "admin API: missing bearer token");
        return Err(AuthError::MissingToken.into());
    };

    match state.auth.verify(&token) {
        Ok(subject) => {
            tracing::debug!(admin = %subject, method = %req.method(), path = %req.uri().path(), "admin request");
            req.extensions_mut().insert(AdminSubject(subject));
            Ok(next.run(req).await)
        }
        Err(e) => {
            // SECURITY: never log the token itself
            tracing::warn!(path = %req.uri().path(), "admin API: {}", e);
            Err(e.into())
        }
    }
}

fn cors_layer(dashboard_origin: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str == dashboard_origin
                || origin_str.starts_with("http://localhost:")
                || origin_str.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    // Responses may carry tokens and service keys.
    headers.insert("cache-control", HeaderValue::from_static("no-store"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.remove("server");

    resp
}
