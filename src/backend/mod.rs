//! Model backends: the connection descriptor handed to a driver, the
//! `ModelClient` capability, and the named registry that maps an
//! application's `binding` to a driver at call time.

pub mod http;
pub mod ollama;
pub mod openai;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::application::Application;
use crate::models::chat::ChatMessage;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Everything a driver needs to reach a backend for one call.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub binding: String,
    pub host_address: String,
    pub service_key: Option<String>,
    pub verify_ssl: bool,
    pub certificate_file_path: Option<String>,
    pub model_name: Option<String>,
}

impl ConnectionDescriptor {
    pub fn for_application(app: &Application, model_name: Option<&str>) -> Self {
        Self {
            binding: app.binding.clone(),
            host_address: app.host_address.clone(),
            service_key: app.service_key.clone(),
            verify_ssl: app.verify_ssl,
            certificate_file_path: app.certificate_file_path.clone(),
            model_name: model_name.map(str::to_string),
        }
    }
}

// service_key stays out of logs.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("binding", &self.binding)
            .field("host_address", &self.host_address)
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("verify_ssl", &self.verify_ssl)
            .field("certificate_file_path", &self.certificate_file_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

/// Capability implemented by every backend driver.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a reply from an ordered message history.
    async fn generate(
        &self,
        conn: &ConnectionDescriptor,
        messages: &[ChatMessage],
    ) -> anyhow::Result<String>;

    /// List model identifiers the backend offers.
    async fn list_models(&self, conn: &ConnectionDescriptor) -> anyhow::Result<Vec<String>>;
}

/// Drivers keyed by binding identifier.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    clients: HashMap<String, Arc<dyn ModelClient>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in drivers: `ollama`, plus `openai`,
    /// `lollms` and `litellm` over the OpenAI-compatible protocol.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("ollama", Arc::new(OllamaClient::new()));
        registry.register("openai", Arc::new(OpenAiClient::new("https://api.openai.com")));
        registry.register("lollms", Arc::new(OpenAiClient::new("http://localhost:9600")));
        registry.register("litellm", Arc::new(OpenAiClient::new("http://localhost:4000")));
        registry
    }

    pub fn register(&mut self, binding: impl Into<String>, client: Arc<dyn ModelClient>) {
        self.clients.insert(binding.into(), client);
    }

    pub fn resolve(&self, binding: &str) -> Option<Arc<dyn ModelClient>> {
        self.clients.get(binding).cloned()
    }

    pub fn bindings(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.keys().cloned().collect();
        names.sort();
        names
    }
}
