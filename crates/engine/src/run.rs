use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tripwire_common::clock::now_ms;

use crate::alert::{load_rules, AlertEvent, AlertStateTable, Evaluator, RuleHealth, RuleStore};
use crate::api::{self, AppState};
use crate::config::EngineConfig;
use crate::metrics::EngineMetrics;
use crate::notifier::{forward, Dispatcher, LogNotifier, RetryNotifier, WebhookNotifier};
use crate::query::PrometheusAdapter;
use crate::scheduler::EvaluationTask;

/// How long shutdown waits for queued notifications to go out.
const NOTIFY_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the evaluator for `config` with the initial rule set loaded.
/// A rule file that does not parse is fatal here.
pub fn build_evaluator(config: &EngineConfig) -> anyhow::Result<Arc<Evaluator>> {
    let rules_path = Path::new(&config.rules_path);
    let rules = load_rules(rules_path)
        .with_context(|| format!("loading rules from {}", rules_path.display()))?;
    tracing::info!(path = %rules_path.display(), rules = rules.len(), "rule set loaded");

    let query_timeout = config.query_timeout();
    let attempts = config.query.max_attempts.max(1);
    let adapter = PrometheusAdapter::new(
        config.query.url.clone(),
        query_timeout / attempts,
        config.query_retry(),
    )
    .context("building query client")?;

    let evaluator = Evaluator::new(
        Arc::new(RuleStore::new(rules)),
        Arc::new(AlertStateTable::new()),
        Arc::new(adapter),
        query_timeout,
    )
    .with_health(Arc::new(RuleHealth::new(config.evaluation.failure_threshold)))
    .with_metrics(EngineMetrics::new());

    Ok(Arc::new(evaluator))
}

pub fn build_dispatcher(config: &EngineConfig, metrics: Arc<EngineMetrics>) -> anyhow::Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new(metrics).with_notifier(Arc::new(LogNotifier));
    if let Some(ref url) = config.notify.webhook_url {
        let webhook = WebhookNotifier::new(url.clone(), config.query_timeout())
            .context("building webhook client")?;
        dispatcher = dispatcher.with_notifier(Arc::new(RetryNotifier::new(
            webhook,
            config.notify.max_retries,
            config.notify.base_delay_ms,
        )));
    }
    Ok(dispatcher)
}

pub async fn run(config: EngineConfig) -> anyhow::Result<()> {
    tracing::info!(
        rules_path = %config.rules_path,
        query_url = %config.query.url,
        interval_s = config.evaluation.interval_seconds,
        query_timeout_ms = config.query_timeout().as_millis() as u64,
        "engine configured"
    );

    let evaluator = build_evaluator(&config)?;
    let ready = Arc::new(AtomicBool::new(true));

    let (events_tx, events_rx) = mpsc::channel(config.notify.channel_capacity);
    let dispatcher = build_dispatcher(&config, evaluator.metrics().clone())?;
    let (stop_dispatch, dispatch_stopped) = tokio::sync::oneshot::channel::<()>();
    let dispatch = tokio::spawn(dispatcher.run_until(events_rx, async move {
        let _ = dispatch_stopped.await;
    }));

    let listener = TcpListener::bind(&config.api.addr)
        .await
        .with_context(|| format!("binding HTTP API on {}", config.api.addr))?;
    spawn_api(
        listener,
        AppState {
            evaluator: evaluator.clone(),
            rules_path: PathBuf::from(&config.rules_path),
            events: events_tx.clone(),
            ready: ready.clone(),
        },
    );

    let hangup = spawn_reload_on_hangup(
        evaluator.clone(),
        PathBuf::from(&config.rules_path),
        events_tx.clone(),
    );

    let task = EvaluationTask {
        interval: config.interval(),
        evaluator,
    }
    .spawn(events_tx);

    tracing::info!("engine running");
    crate::shutdown::wait_for_shutdown().await;

    tracing::info!("shutting down");
    ready.store(false, Ordering::Release);
    task.abort();
    if let Some(ref hangup) = hangup {
        hangup.abort();
    }
    task.stopped().await;
    if let Some(hangup) = hangup {
        let _ = hangup.await;
    }
    // Queued events still go out; later sends see a closed channel.
    let _ = stop_dispatch.send(());
    drain_notifications(dispatch, NOTIFY_DRAIN_TIMEOUT).await;

    Ok(())
}

/// Waits for the dispatcher to deliver what is still queued. Returns false
/// if `limit` passed first.
pub async fn drain_notifications(dispatch: JoinHandle<()>, limit: Duration) -> bool {
    match tokio::time::timeout(limit, dispatch).await {
        Ok(_) => {
            tracing::info!("pending notifications delivered");
            true
        }
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "notification drain timed out");
            false
        }
    }
}

fn spawn_api(listener: TcpListener, state: AppState) {
    let addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_default();
    tokio::spawn(async move {
        tracing::info!(addr = %addr, "HTTP API listening");
        if let Err(e) = api::serve(listener, state).await {
            tracing::error!(error = %e, "HTTP API error");
        }
    });
}

#[cfg(unix)]
fn spawn_reload_on_hangup(
    evaluator: Arc<Evaluator>,
    rules_path: PathBuf,
    tx: mpsc::Sender<AlertEvent>,
) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "SIGHUP handler unavailable, reload only via API");
            return None;
        }
    };
    Some(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!(path = %rules_path.display(), "SIGHUP received, reloading rules");
            if let Ok(outcome) = evaluator.reload_from_file(&rules_path, now_ms()).await {
                forward(&tx, outcome.events).await;
            }
        }
    }))
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(
    _: Arc<Evaluator>,
    _: PathBuf,
    _: mpsc::Sender<AlertEvent>,
) -> Option<JoinHandle<()>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rules_file_is_fatal() {
        let config = EngineConfig {
            rules_path: "/nonexistent/alerts.yml".into(),
            ..EngineConfig::default()
        };
        let err = build_evaluator(&config).err().unwrap();
        assert!(err.to_string().contains("loading rules"));
    }

    #[test]
    fn evaluator_uses_configured_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.yml");
        std::fs::write(&path, "groups:\n  - name: node\n    rules:\n      - alert: A\n        expr: up == 0\n").unwrap();

        let mut config = EngineConfig {
            rules_path: path.display().to_string(),
            ..EngineConfig::default()
        };
        config.evaluation.interval_seconds = 10;
        config.evaluation.query_timeout_fraction = 0.2;

        let evaluator = build_evaluator(&config).unwrap();
        assert_eq!(evaluator.rules().len(), 1);
        assert_eq!(evaluator.query_timeout(), std::time::Duration::from_secs(2));
    }

    #[tokio::test]
    async fn drain_delivers_queued_events_after_senders_drop() {
        use crate::notifier::{Notifier, NotifyError};
        use std::sync::Mutex;

        #[derive(Default)]
        struct Slow {
            seen: Mutex<Vec<String>>,
        }

        #[async_trait::async_trait]
        impl Notifier for Slow {
            fn name(&self) -> &str {
                "slow"
            }

            async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError> {
                tokio::time::sleep(Duration::from_millis(10)).await;
                self.seen.lock().unwrap().push(event.id.clone());
                Ok(())
            }
        }

        let slow = Arc::new(Slow::default());
        let dispatcher = Dispatcher::new(EngineMetrics::new()).with_notifier(slow.clone());
        let (tx, rx) = mpsc::channel(8);
        let dispatch = tokio::spawn(dispatcher.run(rx));

        let events = (0..3).map(|_| crate::notifier::tests::sample_event()).collect();
        forward(&tx, events).await;
        drop(tx);

        assert!(drain_notifications(dispatch, Duration::from_secs(2)).await);
        assert_eq!(slow.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn drain_gives_up_after_limit() {
        let (tx, rx) = mpsc::channel::<AlertEvent>(1);
        let dispatch = tokio::spawn(Dispatcher::new(EngineMetrics::new()).run(rx));
        assert!(!drain_notifications(dispatch, Duration::from_millis(20)).await);
        drop(tx);
    }

    #[test]
    fn webhook_is_optional() {
        let config = EngineConfig::default();
        let d = build_dispatcher(&config, EngineMetrics::new()).unwrap();
        assert_eq!(d.notifier_names(), vec!["log"]);

        let mut config = EngineConfig::default();
        config.notify.webhook_url = Some("http://127.0.0.1:1/hook".into());
        let d = build_dispatcher(&config, EngineMetrics::new()).unwrap();
        assert_eq!(d.notifier_names(), vec!["log", "webhook"]);
    }
}
