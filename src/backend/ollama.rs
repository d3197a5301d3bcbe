//! Ollama driver: `/api/chat` for generation, `/api/tags` for discovery.

use async_trait::async_trait;
use serde_json::json;

use super::http::{build_client, endpoint, send_json, with_auth};
use super::{ConnectionDescriptor, ModelClient};
use crate::models::chat::ChatMessage;

pub const DEFAULT_HOST: &str = "http://localhost:11434";

pub struct OllamaClient;

impl OllamaClient {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(
        &self,
        conn: &ConnectionDescriptor,
        messages: &[ChatMessage],
    ) -> anyhow::Result<String> {
        let model = conn
            .model_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no model name given"))?;
        let client = build_client(conn).await?;
        let url = endpoint(conn, DEFAULT_HOST, "/api/chat");

        tracing::debug!(url = %url, model = %model, "ollama chat");
        let body = json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });
        let value = send_json(with_auth(client.post(&url), conn).json(&body)).await?;

        value
            .pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("ollama response has no message content"))
    }

    async fn list_models(&self, conn: &ConnectionDescriptor) -> anyhow::Result<Vec<String>> {
        let client = build_client(conn).await?;
        let url = endpoint(conn, DEFAULT_HOST, "/api/tags");
        let value = send_json(with_auth(client.get(&url), conn)).await?;

        let models = value
            .get("models")
            .and_then(|m| m.as_array())
            .ok_or_else(|| anyhow::anyhow!("ollama response has no model list"))?;
        Ok(models
            .iter()
            .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
            .map(str::to_string)
            .collect())
    }
}
