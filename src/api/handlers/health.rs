//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::domain::hit_aggregator::AggregatorState;
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Store**: Counts rows
/// 2. **Telemetry Queue**: Checks if the queue is open and reports free slots
/// 3. **Aggregator**: Reports its state; `stopped` is unhealthy
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "store": { "status": "ok", "message": "Reachable, 42 rows" },
///     "telemetry_queue": { "status": "ok", "message": "Free slots: 1000/1000" },
///     "aggregator": { "status": "ok", "message": "idle" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = check_store(&state).await;
    let queue_check = check_telemetry_queue(&state);
    let aggregator_check = check_aggregator(&state);

    let all_healthy = store_check.is_ok() && queue_check.is_ok() && aggregator_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            store: store_check,
            telemetry_queue: queue_check,
            aggregator: aggregator_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_store(state: &AppState) -> CheckStatus {
    match state.url_service.repository().count().await {
        Ok(rows) => CheckStatus::ok(format!("Reachable, {rows} rows")),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: store unreachable");
            CheckStatus::error(format!("Store error: {}", e.message()))
        }
    }
}

fn check_telemetry_queue(state: &AppState) -> CheckStatus {
    let queue = state.url_service.queue();

    if queue.is_closed() {
        CheckStatus::error("Telemetry queue is closed")
    } else {
        CheckStatus::ok(format!(
            "Free slots: {}/{}",
            queue.remaining_capacity(),
            queue.max_capacity()
        ))
    }
}

fn check_aggregator(state: &AppState) -> CheckStatus {
    let current = *state.aggregator_state.borrow();

    match current {
        AggregatorState::Stopped => CheckStatus::error(current.as_str()),
        _ => CheckStatus::ok(current.as_str()),
    }
}
