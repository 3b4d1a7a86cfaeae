#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Durations in ms and byte counts fit in u64
    clippy::cast_precision_loss,      // Counters converted to f64 for rates and percentages
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. SenderError in sender module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod buffer;
pub mod domain;
pub mod reporter;
pub mod sender;
pub mod snapshot;
pub mod zabbix;

// Re-export main types for easy access
pub use app::{App, ReporterConfig};
pub use domain::{ErrorSink, ItemValue, ReporterError, Sample};
pub use reporter::{ReporterOptions, ZabbixReporter};
pub use snapshot::{HealthStatus, MetricsData, MetricsReport, run_report};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
