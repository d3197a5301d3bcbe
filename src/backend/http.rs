//! Shared HTTP plumbing for the reqwest-based drivers.

use std::time::Duration;

use anyhow::Context;
use serde_json::Value;

use super::ConnectionDescriptor;

/// Build a client honouring the descriptor's TLS settings.
///
/// Built per call: TLS settings differ between applications.
pub async fn build_client(conn: &ConnectionDescriptor) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(5));

    if !conn.verify_ssl {
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(path) = &conn.certificate_file_path {
        let pem = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read certificate file {}", path))?;
        let cert = reqwest::Certificate::from_pem(&pem)
            .with_context(|| format!("invalid PEM certificate in {}", path))?;
        builder = builder.add_root_certificate(cert);
    }

    Ok(builder.build()?)
}

/// Join a host and an API path, falling back to `default_host` when the
/// record has no host configured.
pub fn endpoint(conn: &ConnectionDescriptor, default_host: &str, path: &str) -> String {
    let host = if conn.host_address.trim().is_empty() {
        default_host
    } else {
        conn.host_address.trim()
    };
    format!("{}{}", host.trim_end_matches('/'), path)
}

/// Attach the service key as a bearer token when one is configured.
pub fn with_auth(req: reqwest::RequestBuilder, conn: &ConnectionDescriptor) -> reqwest::RequestBuilder {
    match &conn.service_key {
        Some(key) => req.bearer_auth(key),
        None => req,
    }
}

/// Send a request and parse a JSON body, turning non-2xx replies into errors
/// that carry the status and the backend's own message.
pub async fn send_json(req: reqwest::RequestBuilder) -> anyhow::Result<Value> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("backend returned {}: {}", status, body.trim());
    }
    Ok(resp.json::<Value>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(host: &str) -> ConnectionDescriptor {
        ConnectionDescriptor {
            binding: "ollama".into(),
            host_address: host.into(),
            service_key: None,
            verify_ssl: true,
            certificate_file_path: None,
            model_name: None,
        }
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint(&conn("http://localhost:11434/"), "http://x", "/api/chat"),
            "http://localhost:11434/api/chat"
        );
    }

    #[test]
    fn test_endpoint_uses_default_host_when_empty() {
        assert_eq!(
            endpoint(&conn(""), "http://localhost:11434", "/api/tags"),
            "http://localhost:11434/api/tags"
        );
    }

    #[tokio::test]
    async fn test_missing_certificate_file_is_an_error() {
        let mut c = conn("https://localhost");
        c.certificate_file_path = Some("/nonexistent/ca.pem".into());
        let err = build_client(&c).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }
}
