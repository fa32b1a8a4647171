// Health reporting for storage and service resources

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message")]
pub enum HealthStatus {
    Healthy,
    Warning(String),
    Error(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// The worse of two statuses; the first message wins on a tie
    pub fn worst(self, other: HealthStatus) -> HealthStatus {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    fn severity(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Warning(_) => 1,
            HealthStatus::Error(_) => 2,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => f.write_str("healthy"),
            HealthStatus::Warning(message) => write!(f, "warning: {}", message),
            HealthStatus::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// A resource that can report its own health
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Name shown in aggregated reports
    fn resource_name(&self) -> &str;

    async fn health(&self) -> HealthStatus;
}

/// Check several resources and pair each name with its status
pub async fn check_all(resources: &[&dyn HealthCheck]) -> Vec<(String, HealthStatus)> {
    let checks = resources.iter().map(|resource| async move {
        (resource.resource_name().to_string(), resource.health().await)
    });
    futures::future::join_all(checks).await
}
