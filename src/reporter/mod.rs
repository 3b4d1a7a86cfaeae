//! The reporter side: item key naming and the snapshot-to-trapper mapping.

pub mod naming;
pub mod zabbix_reporter;

pub use zabbix_reporter::{ReporterOptions, ZabbixReporter};
