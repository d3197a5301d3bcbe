use std::time::Instant;

use crate::backend::{BackendRegistry, ConnectionDescriptor};
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::chat::ChatMessage;

/// Chat Dispatcher: turns an authorized record into a backend call.
///
/// One attempt per request. Driver errors become `Backend` (chat) or
/// `Configuration` (model discovery) carrying the driver's message.
#[derive(Clone)]
pub struct Dispatcher {
    backends: BackendRegistry,
}

impl Dispatcher {
    pub fn new(backends: BackendRegistry) -> Self {
        Self { backends }
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    pub async fn chat(
        &self,
        app: &Application,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, AppError> {
        let conn = ConnectionDescriptor::for_application(app, Some(model));
        let client = self.backends.resolve(&conn.binding).ok_or_else(|| {
            AppError::Backend(format!("unknown binding '{}'", conn.binding))
        })?;

        let start = Instant::now();
        match client.generate(&conn, messages).await {
            Ok(text) => {
                tracing::info!(
                    binding = %conn.binding,
                    model = %model,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "chat dispatched"
                );
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(binding = %conn.binding, model = %model, "backend call failed: {:#}", e);
                Err(AppError::Backend(format!("{:#}", e)))
            }
        }
    }

    /// Model discovery for an admin-supplied connection.
    pub async fn list_models(&self, conn: &ConnectionDescriptor) -> Result<Vec<String>, AppError> {
        let client = self.backends.resolve(&conn.binding).ok_or_else(|| {
            AppError::Configuration(format!("unknown binding '{}'", conn.binding))
        })?;

        client.list_models(conn).await.map_err(|e| {
            tracing::warn!(binding = %conn.binding, host = %conn.host_address, "model discovery failed: {:#}", e);
            AppError::Configuration(format!("{:#}", e))
        })
    }
}
