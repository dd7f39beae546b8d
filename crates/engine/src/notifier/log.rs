use async_trait::async_trait;

use super::channel::{Notifier, NotifyError};
use crate::alert::AlertEvent;

/// Writes every event to the structured log. Always installed.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        tracing::info!(
            status = event.status_str(),
            severity = event.severity_str(),
            rule = %event.rule_id(),
            labels = %event.labels,
            fingerprint = %event.fingerprint,
            active_since_ms = event.active_since_ms,
            "alert notification"
        );
        Ok(())
    }
}
