//! Read-only registry snapshots and the visitor that reporters implement to
//! receive them.

pub mod health;
pub mod report;
pub mod values;

pub use health::{HealthCheckResult, HealthStatus};
pub use report::{MetricsReport, run_report};
pub use values::{
    CounterItem, CounterValue, CounterValueSource, GaugeValueSource, HistogramValue,
    HistogramValueSource, MeterItem, MeterValue, MeterValueSource, MetricValueSource,
    MetricsData, TimerValue, TimerValueSource,
};
