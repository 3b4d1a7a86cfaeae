//! Domain layer for zabbix-reporter.
//!
//! Contains the canonical types shared across all modules:
//! - `Sample` / `ItemValue`: the unit pushed to a trapper item
//! - `Unit` / `TimeUnit`: unit labels attached to items
//! - `ReporterError`: Top-level error type
//! - `ErrorSink`: where swallowed failures are reported

pub mod error;
pub mod error_sink;
pub mod sample;
pub mod units;

pub use error::ReporterError;
pub use error_sink::ErrorSink;
pub use sample::{ItemValue, Sample};
pub use units::{TimeUnit, Unit};
