use super::ReporterError;
use std::fmt;
use std::sync::Arc;

type Handler = dyn Fn(&ReporterError, &str) + Send + Sync;

/// Callback receiving every failure swallowed inside a report cycle, together
/// with a message naming the failing operation and the server it targeted.
#[derive(Clone)]
pub struct ErrorSink {
    handler: Arc<Handler>,
}

impl ErrorSink {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ReporterError, &str) + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Sink that logs through `tracing` at error level.
    pub fn tracing() -> Self {
        Self::new(|error, context| {
            tracing::error!(error = %error, "{}", context);
        })
    }

    pub fn report(&self, error: &ReporterError, context: &str) {
        (self.handler)(error, context);
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorSink").finish_non_exhaustive()
    }
}
