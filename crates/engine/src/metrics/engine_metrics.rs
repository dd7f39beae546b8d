use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    evaluations: AtomicU64,
    evaluation_failures: AtomicU64,
    alerts_fired: AtomicU64,
    alerts_resolved: AtomicU64,
    rule_reloads: AtomicU64,
    rule_reload_failures: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
    health_faults: AtomicU64,
    evaluation_latency_sum_us: AtomicU64,
    evaluation_latency_count: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_evaluations(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_evaluation_failures(&self) {
        self.evaluation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_alerts_fired(&self, count: u64) {
        self.alerts_fired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_alerts_resolved(&self, count: u64) {
        self.alerts_resolved.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_rule_reloads(&self) {
        self.rule_reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rule_reload_failures(&self) {
        self.rule_reload_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_failed(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_health_faults(&self) {
        self.health_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evaluation_latency(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.evaluation_latency_sum_us
            .fetch_add(us, Ordering::Relaxed);
        self.evaluation_latency_count
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn evaluations_val(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn evaluation_failures_val(&self) -> u64 {
        self.evaluation_failures.load(Ordering::Relaxed)
    }

    pub fn alerts_fired_val(&self) -> u64 {
        self.alerts_fired.load(Ordering::Relaxed)
    }

    pub fn alerts_resolved_val(&self) -> u64 {
        self.alerts_resolved.load(Ordering::Relaxed)
    }

    pub fn rule_reloads_val(&self) -> u64 {
        self.rule_reloads.load(Ordering::Relaxed)
    }

    pub fn rule_reload_failures_val(&self) -> u64 {
        self.rule_reload_failures.load(Ordering::Relaxed)
    }

    pub fn notifications_sent_val(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn notifications_failed_val(&self) -> u64 {
        self.notifications_failed.load(Ordering::Relaxed)
    }

    pub fn health_faults_val(&self) -> u64 {
        self.health_faults.load(Ordering::Relaxed)
    }

    pub fn evaluation_latency_vals(&self) -> (u64, u64) {
        (
            self.evaluation_latency_sum_us.load(Ordering::Relaxed),
            self.evaluation_latency_count.load(Ordering::Relaxed),
        )
    }
}
