pub mod engine_metrics;
pub mod exposition;

pub use engine_metrics::EngineMetrics;
pub use exposition::render_prometheus;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn counters_increment() {
        let m = EngineMetrics::new();
        m.inc_evaluations();
        m.inc_evaluations();
        m.inc_evaluation_failures();
        m.add_alerts_fired(3);
        assert_eq!(m.evaluations_val(), 2);
        assert_eq!(m.evaluation_failures_val(), 1);
        assert_eq!(m.alerts_fired_val(), 3);
    }

    #[test]
    fn latency_recording() {
        let m = EngineMetrics::new();
        let start = Instant::now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        m.record_evaluation_latency(start);
        let (sum, count) = m.evaluation_latency_vals();
        assert!(sum > 0);
        assert_eq!(count, 1);
    }

    #[test]
    fn prometheus_output_contains_metric_names() {
        let m = EngineMetrics::new();
        m.inc_rule_reloads();
        m.add_alerts_resolved(2);
        let output = render_prometheus(&m, &[("tripwire_rules_loaded", 7)]);
        assert!(output.contains("tripwire_rule_reloads_total 1"));
        assert!(output.contains("tripwire_alerts_resolved_total 2"));
        assert!(output.contains("# TYPE tripwire_evaluation_latency_us summary"));
        assert!(output.contains("# TYPE tripwire_rules_loaded gauge"));
        assert!(output.contains("tripwire_rules_loaded 7"));
    }
}
