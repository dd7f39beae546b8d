use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tripwire_common::clock::now_ms;

use crate::alert::{AlertEvent, Evaluator};
use crate::notifier::forward;

/// Periodic evaluation of the whole rule set. A cycle that overruns the
/// interval delays the next one; missed ticks are skipped, not replayed.
/// A full notification channel holds the loop until the dispatcher catches up.
pub struct EvaluationTask {
    pub interval: Duration,
    pub evaluator: Arc<Evaluator>,
}

pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task to end, aborted or not.
    pub async fn stopped(self) {
        let _ = self.handle.await;
    }
}

impl EvaluationTask {
    pub fn spawn(self, tx: mpsc::Sender<AlertEvent>) -> TaskHandle {
        let handle = tokio::spawn(async move {
            tracing::info!(
                interval_seconds = self.interval.as_secs_f64(),
                query_timeout_ms = self.evaluator.query_timeout().as_millis() as u64,
                "evaluation loop started"
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let now = now_ms();
                let events = self.evaluator.tick(now).await;
                if !events.is_empty() {
                    tracing::debug!(events = events.len(), at_ms = now, "tick produced events");
                    forward(&tx, events).await;
                }
            }
        });
        TaskHandle { handle }
    }
}
