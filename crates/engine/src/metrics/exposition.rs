use super::engine_metrics::EngineMetrics;

/// Renders engine counters plus point-in-time gauges in the Prometheus text
/// format. `gauges` are `(name, value)` pairs supplied by the caller.
pub fn render_prometheus(m: &EngineMetrics, gauges: &[(&str, u64)]) -> String {
    let mut out = String::with_capacity(1024);

    write_counter(&mut out, "tripwire_evaluations_total", m.evaluations_val());
    write_counter(&mut out, "tripwire_evaluation_failures_total", m.evaluation_failures_val());
    write_counter(&mut out, "tripwire_alerts_fired_total", m.alerts_fired_val());
    write_counter(&mut out, "tripwire_alerts_resolved_total", m.alerts_resolved_val());
    write_counter(&mut out, "tripwire_rule_reloads_total", m.rule_reloads_val());
    write_counter(&mut out, "tripwire_rule_reload_failures_total", m.rule_reload_failures_val());
    write_counter(&mut out, "tripwire_notifications_sent_total", m.notifications_sent_val());
    write_counter(&mut out, "tripwire_notifications_failed_total", m.notifications_failed_val());
    write_counter(&mut out, "tripwire_health_faults_total", m.health_faults_val());

    let (sum, count) = m.evaluation_latency_vals();
    write_summary(&mut out, "tripwire_evaluation_latency_us", sum, count);

    for (name, val) in gauges {
        write_gauge(&mut out, name, *val);
    }

    out
}

fn write_counter(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {val}");
}

fn write_gauge(out: &mut String, name: &str, val: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} gauge");
    let _ = writeln!(out, "{name} {val}");
}

fn write_summary(out: &mut String, name: &str, sum: u64, count: u64) {
    use std::fmt::Write;
    let _ = writeln!(out, "# TYPE {name} summary");
    let _ = writeln!(out, "{name}_sum {sum}");
    let _ = writeln!(out, "{name}_count {count}");
}
