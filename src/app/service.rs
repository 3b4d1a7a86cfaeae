use crate::reporter::ZabbixReporter;
use crate::snapshot::{HealthStatus, MetricsData, run_report};
use crate::zabbix::{JsonRpcClient, ZabbixApi};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::app::ConfigError),
    #[error("Initialization error: {0}")]
    InitializationError(#[from] crate::app::InitializationError),
    #[error("Report task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Where each cycle's registry snapshot comes from.
pub trait SnapshotSource: Send {
    fn snapshot(&self) -> (MetricsData, Option<HealthStatus>);
}

impl<F> SnapshotSource for F
where
    F: Fn() -> (MetricsData, Option<HealthStatus>) + Send,
{
    fn snapshot(&self) -> (MetricsData, Option<HealthStatus>) {
        self()
    }
}

/// Runs one report cycle per interval until cancelled.
///
/// Cycles never overlap: a cycle that outlasts the interval delays the next
/// tick instead of stacking up.
pub struct ReportService<S: SnapshotSource, A: ZabbixApi = JsonRpcClient> {
    reporter: ZabbixReporter<A>,
    source: S,
    interval: Duration,
    cycles: u64,
}

impl<S, A> ReportService<S, A>
where
    S: SnapshotSource + 'static,
    A: ZabbixApi + 'static,
{
    pub fn new(reporter: ZabbixReporter<A>, source: S, interval: Duration) -> Self {
        Self {
            reporter,
            source,
            interval,
            cycles: 0,
        }
    }

    pub fn reporter(&self) -> &ZabbixReporter<A> {
        &self.reporter
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One snapshot, walked and flushed.
    pub async fn run_cycle(&mut self) {
        let started = std::time::Instant::now();
        let (data, health) = self.source.snapshot();
        run_report(&mut self.reporter, &data, health.as_ref()).await;
        self.cycles += 1;
        debug!("Report cycle {} finished in {:?}", self.cycles, started.elapsed());
    }

    /// Reports every interval, first after one full interval; a last cycle
    /// runs on cancellation so the final values are not lost.
    pub async fn run(mut self, cancel_token: CancellationToken) -> u64 {
        info!(
            "Report service started (interval {:?}, template '{}')",
            self.interval,
            self.reporter.template()
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    info!("Report service received shutdown signal, sending last report");
                    self.run_cycle().await;
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        info!("Report service stopped after {} cycles", self.cycles);
        self.cycles
    }

    #[must_use]
    pub fn spawn(self, cancel_token: CancellationToken) -> JoinHandle<u64> {
        tokio::spawn(self.run(cancel_token))
    }
}
