use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub name: String,
    pub is_healthy: bool,
    #[serde(default)]
    pub message: String,
}

impl HealthCheckResult {
    pub fn healthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_healthy: true,
            message: message.into(),
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_healthy: false,
            message: message.into(),
        }
    }
}

/// Outcome of every registered health check at snapshot time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub results: Vec<HealthCheckResult>,
}

impl HealthStatus {
    pub fn new(results: Vec<HealthCheckResult>) -> Self {
        Self { results }
    }

    pub fn is_healthy(&self) -> bool {
        self.results.iter().all(|r| r.is_healthy)
    }

    pub fn has_registered_checks(&self) -> bool {
        !self.results.is_empty()
    }
}
