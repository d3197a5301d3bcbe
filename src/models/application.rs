//! Application records: the per-consumer gateway configuration.
//!
//! An application is identified by an opaque key. Its `allowed_models`
//! list is an exact-match allow-list; an empty list permits every model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binding used when a record (or a legacy row) does not name one.
pub const DEFAULT_BINDING: &str = "lollms";

/// Key of the seed record ensured at store initialization.
pub const DEMO_APP_KEY: &str = "demo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub key: String,
    pub name: String,
    pub binding: String,
    pub host_address: String,
    pub service_key: Option<String>,
    pub verify_ssl: bool,
    pub certificate_file_path: Option<String>,
    pub allowed_models: Vec<String>,
    pub active: bool,
    pub welcome_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Whether `model` passes this record's allow-list. Case-sensitive.
    pub fn permits_model(&self, model: &str) -> bool {
        self.allowed_models.is_empty() || self.allowed_models.iter().any(|m| m == model)
    }
}

/// Model allow-list as accepted from callers: a JSON array or a
/// comma-separated string such as `"llama3, mistral"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ModelList {
    List(Vec<String>),
    Csv(String),
}

impl ModelList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ModelList::List(items) => normalize_models(items),
            ModelList::Csv(csv) => parse_model_list(&csv),
        }
    }
}

/// Split a comma-separated model list, trimming entries and dropping blanks.
pub fn parse_model_list(csv: &str) -> Vec<String> {
    normalize_models(csv.split(',').map(str::to_string))
}

fn normalize_models<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    items
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}

fn default_binding() -> String {
    DEFAULT_BINDING.to_string()
}

fn default_true() -> bool {
    true
}

/// Empty strings from forms and JSON are treated as "not set".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Payload for creating an application. `key` is generated when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct NewApplication {
    #[serde(default)]
    pub key: Option<String>,
    pub name: String,
    #[serde(default = "default_binding")]
    pub binding: String,
    #[serde(default)]
    pub host_address: Option<String>,
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    #[serde(default)]
    pub certificate_file_path: Option<String>,
    #[serde(default, alias = "allowed_models")]
    pub models: Option<ModelList>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub welcome_message: Option<String>,
}

impl NewApplication {
    /// Minimal payload with every optional field at its default.
    pub fn new(name: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            key: None,
            name: name.into(),
            binding: binding.into(),
            host_address: None,
            service_key: None,
            verify_ssl: true,
            certificate_file_path: None,
            models: None,
            active: true,
            welcome_message: None,
        }
    }

    /// Materialize the record under `key` at time `now`.
    pub fn into_application(self, key: String, now: DateTime<Utc>) -> Application {
        Application {
            key,
            name: self.name.trim().to_string(),
            binding: self.binding.trim().to_string(),
            host_address: self.host_address.map(|h| h.trim().to_string()).unwrap_or_default(),
            service_key: non_empty(self.service_key),
            verify_ssl: self.verify_ssl,
            certificate_file_path: non_empty(self.certificate_file_path),
            allowed_models: self.models.map(ModelList::into_vec).unwrap_or_default(),
            active: self.active,
            welcome_message: non_empty(self.welcome_message),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. Absent fields are left unchanged; for optional string
/// fields an empty string clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationPatch {
    pub name: Option<String>,
    pub binding: Option<String>,
    pub host_address: Option<String>,
    pub service_key: Option<String>,
    pub verify_ssl: Option<bool>,
    pub certificate_file_path: Option<String>,
    #[serde(alias = "allowed_models")]
    pub models: Option<ModelList>,
    pub active: Option<bool>,
    pub welcome_message: Option<String>,
}

impl ApplicationPatch {
    pub fn apply(self, app: &mut Application, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            app.name = name.trim().to_string();
        }
        if let Some(binding) = self.binding {
            app.binding = binding.trim().to_string();
        }
        if let Some(host) = self.host_address {
            app.host_address = host.trim().to_string();
        }
        if let Some(service_key) = self.service_key {
            app.service_key = non_empty(Some(service_key));
        }
        if let Some(verify_ssl) = self.verify_ssl {
            app.verify_ssl = verify_ssl;
        }
        if let Some(path) = self.certificate_file_path {
            app.certificate_file_path = non_empty(Some(path));
        }
        if let Some(models) = self.models {
            app.allowed_models = models.into_vec();
        }
        if let Some(active) = self.active {
            app.active = active;
        }
        if let Some(message) = self.welcome_message {
            app.welcome_message = non_empty(Some(message));
        }
        app.updated_at = now;
    }
}

/// Public view of an application, returned to chat clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub name: String,
    pub welcome_message: Option<String>,
    pub allowed_models: Vec<String>,
}

impl From<&Application> for ApplicationInfo {
    fn from(app: &Application) -> Self {
        Self {
            name: app.name.clone(),
            welcome_message: app.welcome_message.clone(),
            allowed_models: app.allowed_models.clone(),
        }
    }
}
