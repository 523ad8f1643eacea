//! Telegram Bot API sink

use super::AlertSink;
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
    parse_mode: String,
    disable_web_page_preview: bool,
}

#[derive(Clone)]
pub struct TelegramSink {
    http: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_url: DEFAULT_API_URL.to_string(),
            bot_token,
            chat_id,
        })
    }

    /// Point the sink at another Bot API host (self-hosted server, tests)
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }
}

/// Messages go out with `parse_mode: HTML`; plain text must not be read as markup
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[async_trait]
impl AlertSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, message: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: self.chat_id.clone(),
            text: escape_html(message),
            parse_mode: "HTML".to_string(),
            disable_web_page_preview: true,
        };

        let response = self.http.post(self.endpoint()).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Telegram API error: Status {} {}", status, body);
            return Err(TrackerError::Transport(format!("telegram returned {}", status)));
        }

        tracing::debug!("Telegram notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let sink = TelegramSink::new("123:abc".to_string(), "42".to_string())
            .unwrap()
            .with_api_url("http://localhost:8081/");
        assert_eq!(sink.endpoint(), "http://localhost:8081/bot123:abc/sendMessage");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("BTC < 50000 & falling"), "BTC &lt; 50000 &amp; falling");
        assert_eq!(escape_html("<b>&amp;</b>"), "&lt;b&gt;&amp;amp;&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[tokio::test]
    async fn test_notify_unreachable_host_fails() {
        let sink = TelegramSink::new("123:abc".to_string(), "42".to_string())
            .unwrap()
            .with_api_url("http://127.0.0.1:9");
        let err = sink.notify("hello").await.unwrap_err();
        assert!(matches!(err, TrackerError::Transport(_)));
    }
}
