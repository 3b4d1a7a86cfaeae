use super::health::HealthStatus;
use super::values::{CounterValue, HistogramValue, MeterValue, MetricsData, TimerValue};
use crate::domain::{TimeUnit, Unit};

/// Receiver of one walk over a registry snapshot, one method per metric kind.
///
/// [`run_report`] drives an implementation; names passed to the `report_*`
/// methods have already gone through [`format_metric_name`](Self::format_metric_name).
pub trait MetricsReport: Send {
    fn start_report(&mut self, context: &str);

    fn end_report(&mut self, context: &str) -> impl Future<Output = ()> + Send;

    fn start_context(&mut self, _context: &str) {}

    fn end_context(&mut self, _context: &str) {}

    fn report_gauge(
        &mut self,
        name: &str,
        value: f64,
        unit: &Unit,
        tags: &[String],
    ) -> impl Future<Output = ()> + Send;

    fn report_counter(
        &mut self,
        name: &str,
        value: &CounterValue,
        unit: &Unit,
        tags: &[String],
    ) -> impl Future<Output = ()> + Send;

    fn report_meter(
        &mut self,
        name: &str,
        value: &MeterValue,
        unit: &Unit,
        rate_unit: TimeUnit,
        tags: &[String],
    ) -> impl Future<Output = ()> + Send;

    fn report_histogram(
        &mut self,
        name: &str,
        value: &HistogramValue,
        unit: &Unit,
        tags: &[String],
    ) -> impl Future<Output = ()> + Send;

    fn report_timer(
        &mut self,
        name: &str,
        value: &TimerValue,
        unit: &Unit,
        rate_unit: TimeUnit,
        duration_unit: TimeUnit,
        tags: &[String],
    ) -> impl Future<Output = ()> + Send;

    fn report_health(&mut self, status: &HealthStatus) -> impl Future<Output = ()> + Send;

    /// Display name of a context given the names of its enclosing contexts.
    fn format_context_name(&self, stack: &[String], context: &str) -> String {
        stack
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(context))
            .collect::<Vec<_>>()
            .join(" - ")
    }

    fn format_metric_name(&self, context: &str, name: &str) -> String {
        format!("[{context}] {name}")
    }
}

/// Walks `data` depth-first, children in order, then reports health.
///
/// Each context is reported with the stack of its ancestors' raw context
/// names, outermost first.
pub async fn run_report<R: MetricsReport>(
    report: &mut R,
    data: &MetricsData,
    health: Option<&HealthStatus>,
) {
    report.start_report(&data.context);

    let mut pending: Vec<(Vec<String>, &MetricsData)> = vec![(Vec::new(), data)];
    while let Some((stack, context)) = pending.pop() {
        let context_name = report.format_context_name(&stack, &context.context);
        report.start_context(&context_name);

        for gauge in &context.gauges {
            let name = report.format_metric_name(&context_name, &gauge.name);
            report
                .report_gauge(&name, gauge.value, &gauge.unit, &gauge.tags)
                .await;
        }
        for counter in &context.counters {
            let name = report.format_metric_name(&context_name, &counter.name);
            report
                .report_counter(&name, &counter.value, &counter.unit, &counter.tags)
                .await;
        }
        for meter in &context.meters {
            let name = report.format_metric_name(&context_name, &meter.name);
            report
                .report_meter(
                    &name,
                    &meter.value,
                    &meter.unit,
                    meter.value.rate_unit,
                    &meter.tags,
                )
                .await;
        }
        for histogram in &context.histograms {
            let name = report.format_metric_name(&context_name, &histogram.name);
            report
                .report_histogram(&name, &histogram.value, &histogram.unit, &histogram.tags)
                .await;
        }
        for timer in &context.timers {
            let name = report.format_metric_name(&context_name, &timer.name);
            report
                .report_timer(
                    &name,
                    &timer.value,
                    &timer.unit,
                    timer.value.rate.rate_unit,
                    timer.value.duration_unit,
                    &timer.tags,
                )
                .await;
        }

        report.end_context(&context_name);

        // Reversed so the first child is popped first.
        for child in context.child_metrics.iter().rev() {
            let mut child_stack = stack.clone();
            child_stack.push(context.context.clone());
            pending.push((child_stack, child));
        }
    }

    if let Some(status) = health {
        report.report_health(status).await;
    }
    report.end_report(&data.context).await;
}
