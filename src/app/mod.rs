pub mod config;
pub mod initialization;
pub mod logging_system;
pub mod self_metrics;
pub mod service;
pub mod shutdown;

pub use config::{ConfigError, LogLevel, ReporterConfig};
pub use initialization::InitializationError;
pub use logging_system::{LogFormat, LoggingSystem, setup_logging_safe};
pub use self_metrics::SelfMetrics;
pub use service::{ReportService, ServiceError, SnapshotSource};
pub use shutdown::spawn_signal_listener;

use crate::domain::ErrorSink;
use crate::reporter::ZabbixReporter;
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The standalone reporter: pushes its own sender statistics every interval.
pub struct App {
    config: ReporterConfig,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, ServiceError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_config(ReporterConfig::from_args(args)?))
    }

    pub fn from_config(config: ReporterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub async fn run(self, cancel_token: CancellationToken) -> anyhow::Result<u64> {
        let options = self
            .config
            .reporter_options()
            .context("resolving reporter options")?;

        info!("Starting zabbix-reporter v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Configuration: server={}:{}, template={}, local_host={}, provisioning={}",
            options.sender.server,
            options.sender.port,
            options.template,
            options.local_host,
            options.api.is_some()
        );

        let reporter = ZabbixReporter::new(options, ErrorSink::tracing()).await;
        let source = SelfMetrics::new(reporter.template(), reporter.sender().stats_handle());
        let service = ReportService::new(reporter, source, self.config.report_interval);

        let cycles = service
            .spawn(cancel_token)
            .await
            .map_err(ServiceError::from)?;
        Ok(cycles)
    }
}

pub async fn main() -> anyhow::Result<()> {
    let app = App::from_args(std::env::args_os())?;
    setup_logging_safe(app.config().log_level, app.config().log_format())
        .context("initializing logging")?;

    let cancel_token = CancellationToken::new();
    let _signals = spawn_signal_listener(cancel_token.clone());

    info!("zabbix-reporter is running. Press Ctrl+C to stop.");
    let cycles = app.run(cancel_token).await?;
    info!("zabbix-reporter stopped after {} report cycles", cycles);
    Ok(())
}
