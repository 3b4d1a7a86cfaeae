use crate::domain::{TimeUnit, Unit};
use serde::{Deserialize, Serialize};

/// One named metric of a snapshot together with its descriptive metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValueSource<T> {
    pub name: String,
    pub value: T,
    #[serde(default)]
    pub unit: Unit,
    /// Carried for completeness; key naming ignores tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl<T> MetricValueSource<T> {
    pub fn new(name: impl Into<String>, value: T, unit: Unit) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

pub type GaugeValueSource = MetricValueSource<f64>;
pub type CounterValueSource = MetricValueSource<CounterValue>;
pub type MeterValueSource = MetricValueSource<MeterValue>;
pub type HistogramValueSource = MetricValueSource<HistogramValue>;
pub type TimerValueSource = MetricValueSource<TimerValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterValue {
    pub count: u64,
    #[serde(default)]
    pub items: Vec<CounterItem>,
}

/// Share of a counter attributed to one sub-item, e.g. one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterItem {
    pub item: String,
    pub count: u64,
    pub percent: f64,
}

impl CounterValue {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            items: Vec::new(),
        }
    }

    /// Builds sub-items from raw counts, deriving each item's percentage of the total.
    pub fn with_items(count: u64, items: impl IntoIterator<Item = (String, u64)>) -> Self {
        let items = items
            .into_iter()
            .map(|(item, item_count)| CounterItem {
                item,
                count: item_count,
                percent: percent_of(item_count, count),
            })
            .collect();
        Self { count, items }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterValue {
    pub count: u64,
    pub mean_rate: f64,
    pub one_minute_rate: f64,
    pub five_minute_rate: f64,
    pub fifteen_minute_rate: f64,
    #[serde(default)]
    pub rate_unit: TimeUnit,
    #[serde(default)]
    pub items: Vec<MeterItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterItem {
    pub item: String,
    pub value: MeterValue,
    pub percent: f64,
}

impl MeterValue {
    pub fn add_item(&mut self, item: impl Into<String>, value: MeterValue) {
        let percent = percent_of(value.count, self.count);
        self.items.push(MeterItem {
            item: item.into(),
            value,
            percent,
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramValue {
    pub count: u64,
    pub last_value: f64,
    pub max: f64,
    pub mean: f64,
    pub min: f64,
    pub std_dev: f64,
    pub median: f64,
    pub percentile_75: f64,
    pub percentile_95: f64,
    pub percentile_98: f64,
    pub percentile_99: f64,
    pub percentile_999: f64,
    pub sample_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerValue {
    pub rate: MeterValue,
    pub histogram: HistogramValue,
    pub active_sessions: u64,
    #[serde(default)]
    pub duration_unit: TimeUnit,
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Read-only view of one registry context: its metrics and nested contexts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsData {
    pub context: String,
    #[serde(default)]
    pub gauges: Vec<GaugeValueSource>,
    #[serde(default)]
    pub counters: Vec<CounterValueSource>,
    #[serde(default)]
    pub meters: Vec<MeterValueSource>,
    #[serde(default)]
    pub histograms: Vec<HistogramValueSource>,
    #[serde(default)]
    pub timers: Vec<TimerValueSource>,
    #[serde(default)]
    pub child_metrics: Vec<MetricsData>,
}

impl MetricsData {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: MetricsData) -> Self {
        self.child_metrics.push(child);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
            && self.counters.is_empty()
            && self.meters.is_empty()
            && self.histograms.is_empty()
            && self.timers.is_empty()
            && self.child_metrics.iter().all(MetricsData::is_empty)
    }
}
