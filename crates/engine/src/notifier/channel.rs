use async_trait::async_trait;
use thiserror::Error;

use crate::alert::AlertEvent;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}

#[derive(Debug, Error)]
#[error("notify: {0}")]
pub struct NotifyError(pub String);
