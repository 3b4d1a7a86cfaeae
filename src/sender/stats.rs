// Send statistics using atomic operations; only the last failure text sits
// behind a lock.
//
// Updated from the report cycle and read by the self-metrics source, possibly
// from another task.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug)]
pub struct AtomicSenderStats {
    total_sends: AtomicU64,
    successful_sends: AtomicU64,
    rejected_sends: AtomicU64,
    samples_sent: AtomicU64,
    bytes_sent: AtomicU64,
    connection_errors: AtomicU64,
    timeout_errors: AtomicU64,
    protocol_errors: AtomicU64,
    last_latency_ms: AtomicU64,
    last_send_time: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl Default for AtomicSenderStats {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicSenderStats {
    pub fn new() -> Self {
        Self {
            total_sends: AtomicU64::new(0),
            successful_sends: AtomicU64::new(0),
            rejected_sends: AtomicU64::new(0),
            samples_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            timeout_errors: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            last_latency_ms: AtomicU64::new(0),
            last_send_time: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    /// Record a completed round trip, whatever the server answered
    pub fn record_send(&self, success: bool, samples: usize, bytes: usize, latency: Duration) {
        self.total_sends.fetch_add(1, Ordering::Relaxed);
        self.samples_sent.fetch_add(samples as u64, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        self.last_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);

        if success {
            self.successful_sends.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected_sends.fetch_add(1, Ordering::Relaxed);
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.last_send_time.store(now, Ordering::Relaxed);
    }

    pub fn record_connection_error(&self) {
        self.total_sends.fetch_add(1, Ordering::Relaxed);
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout_error(&self) {
        self.total_sends.fetch_add(1, Ordering::Relaxed);
        self.timeout_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_protocol_error(&self) {
        self.total_sends.fetch_add(1, Ordering::Relaxed);
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Remembers why the latest send failed, or forgets it after a success.
    pub fn set_last_error(&self, error: Option<String>) {
        *self.last_error.lock() = error;
    }

    pub fn snapshot(&self) -> SenderStats {
        SenderStats {
            total_sends: self.total_sends.load(Ordering::Relaxed),
            successful_sends: self.successful_sends.load(Ordering::Relaxed),
            rejected_sends: self.rejected_sends.load(Ordering::Relaxed),
            samples_sent: self.samples_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
            timeout_errors: self.timeout_errors.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            last_latency_ms: self.last_latency_ms.load(Ordering::Relaxed),
            last_send_time: self.last_send_time.load(Ordering::Relaxed),
            last_error: self.last_error.lock().clone(),
        }
    }
}

/// Point-in-time copy of [`AtomicSenderStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderStats {
    pub total_sends: u64,
    pub successful_sends: u64,
    pub rejected_sends: u64,
    pub samples_sent: u64,
    pub bytes_sent: u64,
    pub connection_errors: u64,
    pub timeout_errors: u64,
    pub protocol_errors: u64,
    pub last_latency_ms: u64,
    pub last_send_time: u64,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl SenderStats {
    pub fn failed_sends(&self) -> u64 {
        self.rejected_sends + self.connection_errors + self.timeout_errors + self.protocol_errors
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_sends == 0 {
            return 0.0;
        }
        self.successful_sends as f64 / self.total_sends as f64
    }
}
