//! Health check DTOs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "healthy",
    "version": "0.1.0",
    "timestamp": "2025-06-01T12:00:00Z",
    "checks": {
        "database": {
            "status": "healthy",
            "message": "Connected",
            "response_time_ms": 5
        }
    }
}))]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    /// RFC 3339 timestamp of the check
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: String,
    pub checks: HashMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: Option<u64>,
}

impl HealthResponse {
    /// Overall status is the worst component status.
    pub fn from_checks(version: &str, timestamp: String, checks: HashMap<String, ComponentHealth>) -> Self {
        let status = checks
            .values()
            .map(|c| c.status)
            .fold(HealthStatus::Healthy, |worst, s| match (worst, s) {
                (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
                (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
                _ => HealthStatus::Healthy,
            });
        Self {
            status,
            version: version.to_string(),
            timestamp,
            checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(status: HealthStatus) -> ComponentHealth {
        ComponentHealth {
            status,
            message: None,
            response_time_ms: Some(1),
        }
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(serde_json::to_string(&HealthStatus::Healthy).unwrap(), "\"healthy\"");
    }

    #[test]
    fn test_worst_component_wins() {
        let mut checks = HashMap::new();
        checks.insert("database".to_string(), component(HealthStatus::Healthy));
        checks.insert("uploads".to_string(), component(HealthStatus::Degraded));
        let response = HealthResponse::from_checks("0.1.0", "now".into(), checks);
        assert_eq!(response.status, HealthStatus::Degraded);

        let mut checks = HashMap::new();
        checks.insert("database".to_string(), component(HealthStatus::Unhealthy));
        checks.insert("uploads".to_string(), component(HealthStatus::Degraded));
        let response = HealthResponse::from_checks("0.1.0", "now".into(), checks);
        assert_eq!(response.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_no_checks_is_healthy() {
        let response = HealthResponse::from_checks("0.1.0", "now".into(), HashMap::new());
        assert_eq!(response.status, HealthStatus::Healthy);
    }
}
