//! Alert sinks
//!
//! A sink delivers one text message per call. Failures are reported to the
//! tracker, which decides how to surface them.

mod log;
mod telegram;
mod webhook;

pub use self::log::LogSink;
pub use telegram::TelegramSink;
pub use webhook::WebhookSink;

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Destination for triggered-alert notifications
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    async fn notify(&self, message: &str) -> Result<()>;
}

/// Build every sink enabled in the config, in a stable order
pub fn from_config(config: &Config) -> Result<Vec<Arc<dyn AlertSink>>> {
    let mut sinks: Vec<Arc<dyn AlertSink>> = Vec::new();

    if config.log_alerts {
        sinks.push(Arc::new(LogSink));
    }
    if let Some(tg) = &config.telegram {
        sinks.push(Arc::new(TelegramSink::new(tg.bot_token.clone(), tg.chat_id.clone())?));
    }
    if let Some(hook) = &config.webhook {
        sinks.push(Arc::new(WebhookSink::new(hook.url.clone())?));
    }

    if sinks.is_empty() {
        tracing::warn!("No alert sinks configured, triggered alerts will not be delivered");
    }
    Ok(sinks)
}
