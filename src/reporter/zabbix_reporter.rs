use super::naming::{
    self, health_message_name, health_status_name, subfolder_name, subfolder_name_as_percent,
};
use crate::buffer::Batch;
use crate::domain::{ErrorSink, ItemValue, ReporterError, Sample, TimeUnit, Unit};
use crate::sender::{SenderConfig, ZabbixSender};
use crate::snapshot::{
    CounterValue, HealthStatus, HistogramValue, MeterValue, MetricsReport, TimerValue,
};
use crate::zabbix::{
    ApiConfig, DataType, JsonRpcClient, ResourceSynchronizer, ValueType, ZabbixApi,
};
use tracing::{debug, info, warn};

/// Everything a reporter needs, already resolved from configuration.
#[derive(Debug, Clone)]
pub struct ReporterOptions {
    /// Host name attached to every sample; also the host provisioned on the server.
    pub local_host: String,
    /// Template (and application) that owns the provisioned items.
    pub template: String,
    pub sender: SenderConfig,
    /// `None` disables provisioning; samples are still sent.
    pub api: Option<ApiConfig>,
}

/// Maps registry snapshots onto trapper items and pushes one batch per cycle.
///
/// When the synchronizer could not be set up, items are no longer provisioned
/// but samples keep flowing; the server drops those it has no item for.
pub struct ZabbixReporter<A: ZabbixApi = JsonRpcClient> {
    host: String,
    template: String,
    sender: ZabbixSender,
    synchronizer: Option<ResourceSynchronizer<A>>,
    batch: Batch,
    errors: ErrorSink,
}

impl ZabbixReporter<JsonRpcClient> {
    /// Builds the sender and, when API access is configured, provisions the
    /// local host and the template.
    ///
    /// Provisioning failures are reported to `errors` and never fail construction.
    pub async fn new(options: ReporterOptions, errors: ErrorSink) -> Self {
        let Some(api_config) = options.api.clone() else {
            info!("Item provisioning disabled, only sending samples");
            return Self::without_provisioning(options, errors);
        };

        match JsonRpcClient::new(api_config) {
            Ok(client) => {
                let target = client.url().to_string();
                Self::with_api(options, client, target, errors).await
            }
            Err(e) => {
                errors.report(
                    &ReporterError::RemoteObject(e),
                    "Error on creating zabbix api client",
                );
                Self::without_provisioning(options, errors)
            }
        }
    }
}

impl<A: ZabbixApi> ZabbixReporter<A> {
    /// Provisions through `api`; `target` names the server in error messages.
    pub async fn with_api(
        options: ReporterOptions,
        api: A,
        target: impl Into<String>,
        errors: ErrorSink,
    ) -> Self {
        let synchronizer =
            match ResourceSynchronizer::connect(api, target, &options.local_host, errors.clone())
                .await
            {
                Ok(mut synchronizer) => {
                    if !synchronizer.ensure_template(&options.template).await {
                        warn!(
                            "Template '{}' is not ready, items will not be provisioned",
                            options.template
                        );
                    }
                    Some(synchronizer)
                }
                Err(e) => {
                    errors.report(&e, "Error on configuring zabbix host");
                    None
                }
            };

        let mut reporter = Self::without_provisioning(options, errors);
        reporter.synchronizer = synchronizer;
        reporter
    }

    pub fn without_provisioning(options: ReporterOptions, errors: ErrorSink) -> Self {
        Self {
            host: options.local_host,
            template: options.template,
            sender: ZabbixSender::new(options.sender),
            synchronizer: None,
            batch: Batch::new(),
            errors,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn sender(&self) -> &ZabbixSender {
        &self.sender
    }

    /// Samples queued since the cycle started.
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn synchronizer(&self) -> Option<&ResourceSynchronizer<A>> {
        self.synchronizer.as_ref()
    }

    pub fn is_provisioning(&self) -> bool {
        self.synchronizer.is_some()
    }

    /// Ensures the item exists (best effort) and queues the sample either way.
    async fn emit(
        &mut self,
        key: String,
        units: &str,
        value_type: ValueType,
        data_type: DataType,
        value: ItemValue,
    ) {
        if let Some(synchronizer) = self.synchronizer.as_mut() {
            synchronizer
                .ensure_trapper_item(&key, units, value_type, data_type)
                .await;
        }
        self.batch.push(Sample::new(self.host.as_str(), key, value));
    }

    async fn emit_unsigned(&mut self, key: String, unit: &Unit, value: u64) {
        self.emit(key, unit.as_str(), ValueType::Unsigned, DataType::Decimal, value.into())
            .await;
    }

    async fn emit_float(&mut self, key: String, unit: &Unit, value: f64) {
        self.emit(key, unit.as_str(), ValueType::Float, DataType::Decimal, value.into())
            .await;
    }

    async fn report_histogram_with(
        &mut self,
        name: &str,
        value: &HistogramValue,
        unit: &Unit,
        with_main_count: bool,
    ) {
        let none = Unit::none();
        if with_main_count {
            self.emit_unsigned(subfolder_name(name, "Count"), &none, value.count)
                .await;
        }

        let measures = [
            ("Last", value.last_value),
            ("Min", value.min),
            ("Mean", value.mean),
            ("Median", value.median),
            ("Max", value.max),
            ("p75", value.percentile_75),
            ("p95", value.percentile_95),
            ("p98", value.percentile_98),
            ("p99", value.percentile_99),
            ("p999", value.percentile_999),
        ];
        for (sub, measure) in measures {
            self.emit_float(subfolder_name(name, sub), unit, measure).await;
        }

        self.emit_float(subfolder_name(name, "StdDev"), &none, value.std_dev)
            .await;
        self.emit_unsigned(subfolder_name(name, "Sample"), &none, value.sample_size)
            .await;
    }

    async fn report_rates(&mut self, name: &str, value: &MeterValue, rate_unit: &Unit) {
        let rates = [
            ("Rate-Mean", value.mean_rate),
            ("Rate-1-min", value.one_minute_rate),
            ("Rate-5-min", value.five_minute_rate),
            ("Rate-15-min", value.fifteen_minute_rate),
        ];
        for (sub, rate) in rates {
            self.emit_float(subfolder_name(name, sub), rate_unit, rate).await;
        }
    }

    async fn report_meter_with(
        &mut self,
        name: &str,
        value: &MeterValue,
        rate_unit: TimeUnit,
        with_main_count: bool,
    ) {
        let none = Unit::none();
        let rate_unit = rate_unit.unit();

        if with_main_count {
            self.emit_unsigned(subfolder_name(name, "Count"), &none, value.count)
                .await;
        }
        self.report_rates(name, value, &rate_unit).await;

        for item in &value.items {
            let item_name = subfolder_name(name, &item.item);
            self.emit_unsigned(subfolder_name(&item_name, "Count"), &none, item.value.count)
                .await;
            self.emit_float(
                subfolder_name_as_percent(name, &item.item),
                &Unit::percent(),
                item.percent,
            )
            .await;
            self.report_rates(&item_name, &item.value, &rate_unit).await;
        }
    }

    async fn flush(&mut self) {
        let batch = self.batch.take();
        if batch.is_empty() {
            debug!("Nothing to report this cycle");
            return;
        }

        let batch_id = batch.id().to_string();
        let count = batch.size();
        match self.sender.send(batch.samples()).await {
            Ok(response) if response.is_success() => {
                info!(
                    batch_id = %batch_id,
                    samples = count,
                    processed = ?response.processed(),
                    failed = ?response.failed(),
                    "Reported metrics to {}",
                    self.sender.address()
                );
            }
            Ok(response) => {
                self.errors.report(
                    &ReporterError::Protocol(format!(
                        "server answered '{}' ({})",
                        response.response, response.info
                    )),
                    &format!(
                        "Error on sending {} samples to zabbix server {}",
                        count,
                        self.sender.address()
                    ),
                );
            }
            Err(e) => {
                self.errors.report(
                    &e.into(),
                    &format!(
                        "Error on sending {} samples to zabbix server {}",
                        count,
                        self.sender.address()
                    ),
                );
            }
        }
    }
}

impl<A: ZabbixApi> MetricsReport for ZabbixReporter<A> {
    fn start_report(&mut self, _context: &str) {
        self.batch.clear();
    }

    async fn end_report(&mut self, _context: &str) {
        self.flush().await;
    }

    async fn report_gauge(&mut self, name: &str, value: f64, unit: &Unit, _tags: &[String]) {
        if !value.is_finite() {
            debug!("Skipping gauge {} with non-finite value {}", name, value);
            return;
        }
        self.emit_float(name.to_string(), unit, value).await;
    }

    async fn report_counter(
        &mut self,
        name: &str,
        value: &CounterValue,
        unit: &Unit,
        _tags: &[String],
    ) {
        self.emit_unsigned(name.to_string(), unit, value.count).await;
        for item in &value.items {
            self.emit_unsigned(subfolder_name(name, &item.item), unit, item.count)
                .await;
            self.emit_float(
                subfolder_name_as_percent(name, &item.item),
                &Unit::percent(),
                item.percent,
            )
            .await;
        }
    }

    async fn report_meter(
        &mut self,
        name: &str,
        value: &MeterValue,
        _unit: &Unit,
        rate_unit: TimeUnit,
        _tags: &[String],
    ) {
        self.report_meter_with(name, value, rate_unit, true).await;
    }

    async fn report_histogram(
        &mut self,
        name: &str,
        value: &HistogramValue,
        unit: &Unit,
        _tags: &[String],
    ) {
        self.report_histogram_with(name, value, unit, true).await;
    }

    async fn report_timer(
        &mut self,
        name: &str,
        value: &TimerValue,
        _unit: &Unit,
        rate_unit: TimeUnit,
        duration_unit: TimeUnit,
        _tags: &[String],
    ) {
        self.emit_unsigned(
            subfolder_name(name, "ActiveSessions"),
            &Unit::none(),
            value.active_sessions,
        )
        .await;
        self.report_meter_with(name, &value.rate, rate_unit, true)
            .await;
        self.report_histogram_with(
            &subfolder_name(name, "Duration"),
            &value.histogram,
            &duration_unit.unit(),
            false,
        )
        .await;
    }

    async fn report_health(&mut self, status: &HealthStatus) {
        for result in &status.results {
            let status_key = health_status_name(&result.name);
            let message_key = health_message_name(&result.name);

            self.emit(
                status_key,
                "",
                ValueType::Unsigned,
                DataType::Boolean,
                result.is_healthy.into(),
            )
            .await;

            // Provisioned while healthy too, so the item exists on first failure.
            if let Some(synchronizer) = self.synchronizer.as_mut() {
                synchronizer
                    .ensure_trapper_item(&message_key, "", ValueType::Text, DataType::Decimal)
                    .await;
            }

            if !result.is_healthy {
                self.batch.push(Sample::new(
                    self.host.as_str(),
                    message_key,
                    result.message.as_str(),
                ));
            }
        }
    }

    fn format_context_name(&self, stack: &[String], context: &str) -> String {
        naming::format_context_name(stack, context)
    }

    fn format_metric_name(&self, context: &str, name: &str) -> String {
        naming::format_metric_name(context, name)
    }
}
