use super::service::SnapshotSource;
use crate::domain::{TimeUnit, Unit};
use crate::sender::AtomicSenderStats;
use crate::snapshot::{
    CounterValue, CounterValueSource, GaugeValueSource, HealthCheckResult, HealthStatus,
    MetricsData,
};
use std::sync::Arc;
use std::time::Instant;

/// Context the reporter's own metrics are filed under.
pub const SELF_METRICS_CONTEXT: &str = "ZabbixReporter";

/// Health check reflecting whether the latest batch was accepted.
pub const SENDER_HEALTH_CHECK: &str = "ZabbixSender";

/// Snapshot source describing the reporter itself: send counts, volume,
/// latency and the outcome of the latest send.
pub struct SelfMetrics {
    global_context: String,
    stats: Arc<AtomicSenderStats>,
    started: Instant,
}

impl SelfMetrics {
    pub fn new(global_context: impl Into<String>, stats: Arc<AtomicSenderStats>) -> Self {
        Self {
            global_context: global_context.into(),
            stats,
            started: Instant::now(),
        }
    }
}

impl SnapshotSource for SelfMetrics {
    fn snapshot(&self) -> (MetricsData, Option<HealthStatus>) {
        let stats = self.stats.snapshot();
        let mut context = MetricsData::new(SELF_METRICS_CONTEXT);

        context.gauges.push(GaugeValueSource::new(
            "Uptime",
            self.started.elapsed().as_secs_f64(),
            TimeUnit::Seconds.unit(),
        ));
        context.gauges.push(GaugeValueSource::new(
            "Last Send Latency",
            stats.last_latency_ms as f64,
            TimeUnit::Milliseconds.unit(),
        ));
        context.gauges.push(GaugeValueSource::new(
            "Success Rate",
            stats.success_rate() * 100.0,
            Unit::percent(),
        ));

        context.counters.push(CounterValueSource::new(
            "Sends",
            CounterValue::with_items(
                stats.total_sends,
                [
                    ("Successful".to_string(), stats.successful_sends),
                    ("Rejected".to_string(), stats.rejected_sends),
                    ("ConnectionErrors".to_string(), stats.connection_errors),
                    ("Timeouts".to_string(), stats.timeout_errors),
                    ("ProtocolErrors".to_string(), stats.protocol_errors),
                ],
            ),
            Unit::custom("sends"),
        ));
        context.counters.push(CounterValueSource::new(
            "Samples Sent",
            CounterValue::new(stats.samples_sent),
            Unit::custom("samples"),
        ));
        context.counters.push(CounterValueSource::new(
            "Bytes Sent",
            CounterValue::new(stats.bytes_sent),
            Unit::custom("B"),
        ));

        let health = match stats.last_error {
            Some(error) => HealthCheckResult::unhealthy(SENDER_HEALTH_CHECK, error),
            None if stats.total_sends == 0 => {
                HealthCheckResult::healthy(SENDER_HEALTH_CHECK, "No batch sent yet")
            }
            None => HealthCheckResult::healthy(SENDER_HEALTH_CHECK, "Last batch accepted"),
        };

        let data = MetricsData::new(self.global_context.clone()).with_child(context);
        (data, Some(HealthStatus::new(vec![health])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_snapshot_layout() {
        let stats = Arc::new(AtomicSenderStats::new());
        stats.record_send(true, 10, 400, Duration::from_millis(3));
        let source = SelfMetrics::new("MetricsDemo", stats);

        let (data, health) = source.snapshot();
        assert_eq!(data.context, "MetricsDemo");
        assert_eq!(data.child_metrics.len(), 1);

        let own = &data.child_metrics[0];
        assert_eq!(own.context, SELF_METRICS_CONTEXT);
        let sends = &own.counters[0];
        assert_eq!(sends.value.count, 1);
        assert_eq!(sends.value.items[0].item, "Successful");
        assert_eq!(sends.value.items[0].percent, 100.0);

        let health = health.unwrap();
        assert!(health.is_healthy());
    }

    #[test]
    fn test_last_error_fails_health_check() {
        let stats = Arc::new(AtomicSenderStats::new());
        stats.record_timeout_error();
        stats.set_last_error(Some("No response within 500ms".to_string()));

        let (_, health) = SelfMetrics::new("MetricsDemo", stats).snapshot();
        let result = &health.unwrap().results[0];
        assert!(!result.is_healthy);
        assert_eq!(result.name, SENDER_HEALTH_CHECK);
        assert_eq!(result.message, "No response within 500ms");
    }
}
