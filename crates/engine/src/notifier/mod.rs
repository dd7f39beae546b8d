mod channel;
mod dispatch;
mod log;
mod retry;
mod webhook;

pub use channel::{Notifier, NotifyError};
pub use dispatch::{forward, Dispatcher};
pub use log::LogNotifier;
pub use retry::RetryNotifier;
pub use webhook::WebhookNotifier;

#[cfg(test)]
pub(crate) mod tests {
    use crate::alert::{AlertEvent, AlertStatus, Severity};
    use std::collections::BTreeMap;
    use tripwire_common::labels::LabelSet;

    pub(crate) fn sample_event() -> AlertEvent {
        AlertEvent {
            id: uuid::Uuid::new_v4().to_string(),
            fingerprint: "00000000000000ff".into(),
            status: AlertStatus::Firing,
            rule: "ServiceDown".into(),
            group: "node".into(),
            severity: Severity::Critical,
            labels: [("alertname", "ServiceDown"), ("job", "api")]
                .into_iter()
                .collect::<LabelSet>(),
            annotations: BTreeMap::new(),
            value: 0.0,
            active_since_ms: 1_000,
            timestamp_ms: 301_000,
        }
    }

    #[tokio::test]
    async fn log_notifier_accepts_everything() {
        use super::{LogNotifier, Notifier};
        assert!(LogNotifier.send(&sample_event()).await.is_ok());
    }
}
