//! Access Guard: decides whether an application key may call a model.
//!
//! Checks, in order:
//! 1. the key resolves to a record (`NotFound` otherwise)
//! 2. the record is active
//! 3. the model is on the record's allow-list, if it has one
//!
//! Failures of 2 and 3 both surface as a bare `Forbidden`; the reason is
//! only logged. Matching is exact and case-sensitive. Every call reads the
//! registry afresh.

use crate::errors::AppError;
use crate::models::application::Application;
use crate::registry::{mask_key, Registry};

/// Why a request was refused. Logged, never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Inactive,
    ModelNotAllowed,
}

/// Check a record against a requested model without touching the store.
pub fn check_model_access(app: &Application, requested_model: &str) -> Result<(), Denial> {
    if !app.active {
        return Err(Denial::Inactive);
    }
    if !app.permits_model(requested_model) {
        return Err(Denial::ModelNotAllowed);
    }
    Ok(())
}

/// Resolve `app_key` and authorize `model`, returning the record to dispatch with.
pub async fn authorize(
    registry: &Registry,
    app_key: &str,
    model: &str,
) -> Result<Application, AppError> {
    let app = match registry.get(app_key).await {
        Ok(app) => app,
        Err(AppError::NotFound) => {
            tracing::warn!(app = %mask_key(app_key), "chat rejected: unknown application");
            return Err(AppError::NotFound);
        }
        Err(e) => return Err(e),
    };

    if let Err(denial) = check_model_access(&app, model) {
        tracing::warn!(
            app = %mask_key(app_key),
            model = %model,
            reason = ?denial,
            "chat rejected by access guard"
        );
        return Err(AppError::Forbidden);
    }

    Ok(app)
}

// ── Tests ───────────────────────────────────────────────────────
