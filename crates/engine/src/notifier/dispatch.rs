use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::channel::Notifier;
use crate::alert::AlertEvent;
use crate::metrics::EngineMetrics;

/// Drains the event channel and hands each event to every notifier in
/// order. Delivery failures are logged and counted, nothing more.
pub struct Dispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    metrics: Arc<EngineMetrics>,
}

impl Dispatcher {
    pub fn new(metrics: Arc<EngineMetrics>) -> Self {
        Self {
            notifiers: Vec::new(),
            metrics,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn notifier_names(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    pub async fn dispatch(&self, event: &AlertEvent) {
        for notifier in &self.notifiers {
            match notifier.send(event).await {
                Ok(()) => self.metrics.inc_notifications_sent(),
                Err(e) => {
                    self.metrics.inc_notifications_failed();
                    tracing::error!(
                        notifier = notifier.name(),
                        rule = %event.rule_id(),
                        fingerprint = %event.fingerprint,
                        error = %e,
                        "notification dropped"
                    );
                }
            }
        }
    }

    /// Runs until every sender is dropped.
    pub async fn run(self, rx: mpsc::Receiver<AlertEvent>) {
        self.run_until(rx, std::future::pending()).await
    }

    /// Runs until every sender is dropped or `shutdown` completes. On
    /// shutdown the channel is closed to new events and whatever is already
    /// queued is still delivered.
    pub async fn run_until<F>(self, mut rx: mpsc::Receiver<AlertEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(notifiers = ?self.notifier_names(), "notification dispatcher started");
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(event) => self.dispatch(&event).await,
                    None => break,
                },
                _ = &mut shutdown => {
                    rx.close();
                    while let Some(event) = rx.recv().await {
                        self.dispatch(&event).await;
                    }
                    break;
                }
            }
        }
        tracing::info!("notification dispatcher stopped");
    }
}

/// Queues events for the dispatcher, waiting for room when the channel is
/// full. Firing and resolved are edge events that are never re-emitted, so
/// they are not dropped under load. Returns how many could not be queued
/// because the dispatcher is gone.
pub async fn forward(tx: &mpsc::Sender<AlertEvent>, events: Vec<AlertEvent>) -> usize {
    let mut undelivered = 0;
    for event in events {
        if let Err(mpsc::error::SendError(event)) = tx.send(event).await {
            undelivered += 1;
            tracing::error!(
                rule = %event.rule_id(),
                fingerprint = %event.fingerprint,
                "notification channel closed, event not delivered"
            );
        }
    }
    undelivered
}
