use super::serialization::{SenderResponse, SerializationError, decode_response, encode_request};
use super::stats::{AtomicSenderStats, SenderStats};
use crate::domain::{ItemValue, Sample};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Granularity of the reply wait loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The reply is read once into a buffer of this size; longer replies are cut.
pub const RESPONSE_BUFFER_SIZE: usize = 1024;

pub const DEFAULT_TRAPPER_PORT: u16 = 10051;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Writing request failed: {0}")]
    Write(#[source] std::io::Error),
    #[error("Reading response failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("No response within {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("Unparseable response: {0}")]
    Protocol(String),
    #[error("Request serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl From<SerializationError> for SenderError {
    fn from(err: SerializationError) -> Self {
        match err {
            SerializationError::JsonError(e) => SenderError::Serialization(e),
            other => SenderError::Protocol(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub server: String,
    pub port: u16,
    /// How long to wait for the reply once the request is written
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".to_string(),
            port: DEFAULT_TRAPPER_PORT,
            timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Trapper protocol client. Every call opens its own connection.
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    config: SenderConfig,
    stats: Arc<AtomicSenderStats>,
}

impl ZabbixSender {
    pub fn new(config: SenderConfig) -> Self {
        Self {
            config,
            stats: Arc::new(AtomicSenderStats::new()),
        }
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server, self.config.port)
    }

    pub fn stats(&self) -> SenderStats {
        self.stats.snapshot()
    }

    /// Shared handle for readers outliving a borrow of the sender.
    pub fn stats_handle(&self) -> Arc<AtomicSenderStats> {
        Arc::clone(&self.stats)
    }

    /// Sends one value to one item.
    pub async fn send_value(
        &self,
        host: &str,
        key: &str,
        value: impl Into<ItemValue>,
    ) -> Result<SenderResponse, SenderError> {
        self.send(&[Sample::new(host, key, value)]).await
    }

    pub async fn send(&self, samples: &[Sample]) -> Result<SenderResponse, SenderError> {
        self.send_with_timeout(samples, self.config.timeout).await
    }

    pub async fn send_with_timeout(
        &self,
        samples: &[Sample],
        wait: Duration,
    ) -> Result<SenderResponse, SenderError> {
        let start = Instant::now();
        let payload = encode_request(samples)?;

        let result = self.round_trip(&payload, wait).await;
        match &result {
            Ok(response) => {
                let latency = start.elapsed();
                self.stats
                    .record_send(response.is_success(), samples.len(), payload.len(), latency);
                if response.is_success() {
                    debug!(
                        "Sent {} samples ({} bytes) to {} in {:?}: {}",
                        samples.len(),
                        payload.len(),
                        self.address(),
                        latency,
                        response.info
                    );
                } else {
                    warn!(
                        "Server {} answered '{}' for {} samples: {}",
                        self.address(),
                        response.response,
                        samples.len(),
                        response.info
                    );
                }
            }
            Err(SenderError::Timeout { .. }) => self.stats.record_timeout_error(),
            Err(SenderError::Protocol(_)) => self.stats.record_protocol_error(),
            Err(_) => self.stats.record_connection_error(),
        }

        self.stats.set_last_error(match &result {
            Ok(response) if response.is_success() => None,
            Ok(response) => Some(format!(
                "Server answered '{}': {}",
                response.response, response.info
            )),
            Err(e) => Some(e.to_string()),
        });

        result
    }

    async fn round_trip(&self, payload: &[u8], wait: Duration) -> Result<SenderResponse, SenderError> {
        let addr = self.address();
        let mut stream = timeout(
            self.config.connect_timeout,
            TcpStream::connect((self.config.server.as_str(), self.config.port)),
        )
        .await
        .map_err(|_| SenderError::Connect {
            addr: addr.clone(),
            source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
        })?
        .map_err(|source| SenderError::Connect { addr, source })?;

        stream.write_all(payload).await.map_err(SenderError::Write)?;
        stream.flush().await.map_err(SenderError::Write)?;

        Self::wait_for_reply(&stream, wait).await?;

        let mut buffer = [0u8; RESPONSE_BUFFER_SIZE];
        let read = timeout(wait.max(POLL_INTERVAL), stream.read(&mut buffer))
            .await
            .map_err(|_| SenderError::Timeout { timeout: wait })?
            .map_err(SenderError::Read)?;

        Ok(decode_response(&buffer[..read])?)
    }

    /// Waits in `POLL_INTERVAL` steps until the socket is readable, giving up
    /// after `wait`.
    async fn wait_for_reply(stream: &TcpStream, wait: Duration) -> Result<(), SenderError> {
        let max_polls = (wait.as_millis() / POLL_INTERVAL.as_millis()).max(1);
        let mut polls = 0;

        loop {
            match timeout(POLL_INTERVAL, stream.readable()).await {
                Ok(ready) => return ready.map_err(SenderError::Read),
                Err(_) => {
                    polls += 1;
                    if polls >= max_polls {
                        return Err(SenderError::Timeout { timeout: wait });
                    }
                }
            }
        }
    }
}
