//! ============================================================================
//! Webhook Client - HTTP+JSON calls to the automation backend
//! ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::decode::extract_user_id;
use super::{RemoteBackend, SyncNotification};

/// reqwest client bound to one webhook base URL
pub struct WebhookClient {
    client: reqwest::Client,
    base_url: String,
}

impl WebhookClient {
    /// Create a client for `base_url` (e.g. "https://host/webhook")
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    senha: &'a str,
}

#[async_trait]
impl RemoteBackend for WebhookClient {
    async fn login(&self, email: &str, password: &str) -> Result<Option<String>> {
        info!("Logging in as {}", email);

        let response = self
            .client
            .post(self.endpoint("/login"))
            .json(&LoginRequest { email, senha: password })
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach login webhook: {}", e))?;

        // The status code carries no meaning here, only the body does
        let body: Value = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse login response: {}", e))?;

        Ok(extract_user_id(&body))
    }

    async fn fetch_template(&self, user_id: &str) -> Result<Value> {
        debug!("Fetching template for user {}", user_id);

        let response = self
            .client
            .get(self.endpoint("/template/buscar"))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| anyhow!("Failed to fetch template: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Template webhook error {}: {}", status, body));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse template response: {}", e))
    }

    async fn notify(&self, notification: &SyncNotification) -> Result<()> {
        debug!("Sending {} notification", notification.kind());

        let response = self
            .client
            .post(self.endpoint(notification.path()))
            .json(&notification.body())
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send {}: {}", notification.kind(), e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} webhook error {}: {}", notification.kind(), status, body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base() {
        let client = WebhookClient::new("https://hooks.example.com/webhook/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://hooks.example.com/webhook");
        assert_eq!(
            client.endpoint("/template/deletar-item"),
            "https://hooks.example.com/webhook/template/deletar-item"
        );
    }

    #[test]
    fn test_login_body_field_names() {
        let body = serde_json::to_value(LoginRequest {
            email: "ana@example.com",
            senha: "secret",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "email": "ana@example.com", "senha": "secret" }));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        // Port 9 (discard) on localhost is not expected to speak HTTP
        let client = WebhookClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(client.fetch_template("u-1").await.is_err());
    }
}
