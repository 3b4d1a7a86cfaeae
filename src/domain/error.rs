use crate::sender::SenderError;
use crate::zabbix::ApiError;
use thiserror::Error;

/// Top-level error type handed to the error sink.
///
/// None of these escape a report cycle: each is reported and converted into a
/// boolean failure or a dropped batch at the point where it occurs.
#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Remote object error: {0}")]
    RemoteObject(#[from] ApiError),

    #[error("Transport error: {0}")]
    Transport(SenderError),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<SenderError> for ReporterError {
    fn from(err: SenderError) -> Self {
        match err {
            SenderError::Protocol(msg) => ReporterError::Protocol(msg),
            other => ReporterError::Transport(other),
        }
    }
}
