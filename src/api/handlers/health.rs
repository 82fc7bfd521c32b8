//! Health, readiness and liveness probes.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode};
use diesel_async::RunQueryDsl;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;

pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

/// Database and upload storage status with the running version.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = HashMap::new();
    checks.insert("database".to_string(), check_database(&state).await);
    checks.insert(
        "uploads".to_string(),
        check_directory(&state.services.products.files().images_dir()).await,
    );

    let response = HealthResponse::from_checks(
        env!("CARGO_PKG_VERSION"),
        jiff::Timestamp::now().to_string(),
        checks,
    );
    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(response))
}

#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service is not ready")
    ),
    tag = HEALTH_TAG
)]
async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match check_database(&state).await.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded | HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Does not touch any dependency.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive")
    ),
    tag = HEALTH_TAG
)]
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

async fn check_database(state: &AppState) -> ComponentHealth {
    let start = Instant::now();
    let elapsed = |start: Instant| Some(start.elapsed().as_millis() as u64);

    match state.db_pool.get().await {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn).await {
            Ok(_) => ComponentHealth {
                status: HealthStatus::Healthy,
                message: Some("Connected".to_string()),
                response_time_ms: elapsed(start),
            },
            Err(e) => ComponentHealth {
                status: HealthStatus::Unhealthy,
                message: Some(format!("Query failed: {e}")),
                response_time_ms: elapsed(start),
            },
        },
        Err(e) => ComponentHealth {
            status: HealthStatus::Unhealthy,
            message: Some(format!("Connection failed: {e}")),
            response_time_ms: elapsed(start),
        },
    }
}

/// A missing upload directory only degrades the service; it is created on
/// the first upload.
async fn check_directory(path: &Path) -> ComponentHealth {
    let start = Instant::now();
    let (status, message) = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => (HealthStatus::Healthy, "Available".to_string()),
        Ok(_) => (
            HealthStatus::Unhealthy,
            format!("{} is not a directory", path.display()),
        ),
        Err(_) => (
            HealthStatus::Degraded,
            format!("{} does not exist yet", path.display()),
        ),
    };
    ComponentHealth {
        status,
        message: Some(message),
        response_time_ms: Some(start.elapsed().as_millis() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness_check() {
        assert_eq!(liveness_check().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_existing_directory_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check_directory(dir.path()).await.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_missing_directory_is_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let health = check_directory(&dir.path().join("images")).await;
        assert_eq!(health.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_file_instead_of_directory_is_unhealthy() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(check_directory(file.path()).await.status, HealthStatus::Unhealthy);
    }
}
