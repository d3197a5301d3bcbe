//! OpenAI-compatible driver: `/v1/chat/completions` and `/v1/models`.
//! Also serves lollms and litellm servers, which expose the same API.

use async_trait::async_trait;
use serde_json::json;

use super::http::{build_client, endpoint, send_json, with_auth};
use super::{ConnectionDescriptor, ModelClient};
use crate::models::chat::ChatMessage;

pub struct OpenAiClient {
    default_host: String,
}

impl OpenAiClient {
    pub fn new(default_host: impl Into<String>) -> Self {
        Self {
            default_host: default_host.into(),
        }
    }

    /// Hosts may be configured with or without the `/v1` suffix.
    fn url(&self, conn: &ConnectionDescriptor, path: &str) -> String {
        let base = endpoint(conn, &self.default_host, "");
        let base = base.trim_end_matches('/').trim_end_matches("/v1");
        format!("{}/v1{}", base, path)
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
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
        let url = self.url(conn, "/chat/completions");

        tracing::debug!(url = %url, model = %model, binding = %conn.binding, "chat completion");
        let body = json!({
            "model": model,
            "messages": messages,
        });
        let value = send_json(with_auth(client.post(&url), conn).json(&body)).await?;

        value
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("completion response has no message content"))
    }

    async fn list_models(&self, conn: &ConnectionDescriptor) -> anyhow::Result<Vec<String>> {
        let client = build_client(conn).await?;
        let url = self.url(conn, "/models");
        let value = send_json(with_auth(client.get(&url), conn)).await?;

        let data = value
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| anyhow::anyhow!("models response has no data array"))?;
        Ok(data
            .iter()
            .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(host: &str) -> ConnectionDescriptor {
        ConnectionDescriptor {
            binding: "openai".into(),
            host_address: host.into(),
            service_key: None,
            verify_ssl: true,
            certificate_file_path: None,
            model_name: None,
        }
    }

    #[test]
    fn test_url_with_and_without_v1_suffix() {
        let client = OpenAiClient::new("https://api.openai.com");
        assert_eq!(
            client.url(&conn("https://api.openai.com/v1/"), "/models"),
            "https://api.openai.com/v1/models"
        );
        assert_eq!(
            client.url(&conn("http://localhost:9600"), "/chat/completions"),
            "http://localhost:9600/v1/chat/completions"
        );
        assert_eq!(client.url(&conn(""), "/models"), "https://api.openai.com/v1/models");
    }
}
