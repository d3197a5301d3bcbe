//! appgate — keyed application gateway for LLM backends.
//!
//! Library crate shared by the `appgate` binary and the integration tests.

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod proxy;
pub mod registry;
pub mod store;

use auth::AdminAuthenticator;
use backend::BackendRegistry;
use proxy::dispatch::Dispatcher;
use registry::Registry;
use store::sqlite::SqliteStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub config: config::Config,
    pub auth: AdminAuthenticator,
    pub registry: Registry,
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Open and migrate the store, then wire up the components.
    pub async fn initialize(
        config: config::Config,
        backends: BackendRegistry,
    ) -> anyhow::Result<Arc<Self>> {
        tracing::info!("Opening database...");
        let store = SqliteStore::connect(&config.database_url).await?;

        tracing::info!("Running migrations...");
        store.migrate().await?;

        Ok(Arc::new(Self {
            auth: AdminAuthenticator::new(&config),
            registry: Registry::new(store),
            dispatcher: Dispatcher::new(backends),
            config,
        }))
    }
}
