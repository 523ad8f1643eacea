//! Incoming-webhook sink (Slack-compatible `{"text": ...}` payload)

use super::AlertSink;
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use reqwest::Client;

#[derive(Clone)]
pub struct WebhookSink {
    http: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, message: &str) -> Result<()> {
        let payload = serde_json::json!({ "text": message });

        let response = self.http.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Webhook {} returned {}", self.url, status);
            return Err(TrackerError::Transport(format!("webhook returned {}", status)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_unreachable_host_fails() {
        let sink = WebhookSink::new("http://127.0.0.1:9/hook".to_string()).unwrap();
        assert!(sink.notify("hello").await.is_err());
    }
}
