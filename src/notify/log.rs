use super::AlertSink;
use crate::error::Result;
use async_trait::async_trait;

/// Writes alerts to the tracing log; never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, message: &str) -> Result<()> {
        tracing::warn!(target: "alerts", "{}", message);
        Ok(())
    }
}
