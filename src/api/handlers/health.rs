//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use std::time::Duration;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::domain::entities::{Claims, Role};
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
/// 1. **Store**: `SELECT 1` on the PostgreSQL pool, or the in-memory store
/// 2. **Signing keys**: a probe token signed with the active key verifies
///    through the published key set
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store = check_store(&state).await;
    let signing_keys = check_signing_keys(&state).await;

    let all_healthy = store.is_ok() && signing_keys.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            store,
            signing_keys,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_store(state: &AppState) -> CheckStatus {
    let Some(pool) = &state.db else {
        return CheckStatus::ok("In-memory store");
    };

    match sqlx::query("SELECT 1").execute(pool.as_ref()).await {
        Ok(_) => CheckStatus::ok("PostgreSQL connected"),
        Err(e) => CheckStatus::error(format!("Database error: {e}")),
    }
}

/// Catches an active key id that is missing from the verification key set.
async fn check_signing_keys(state: &AppState) -> CheckStatus {
    let authenticator = &state.authenticator;
    let probe = Claims::new("health-check", [Role::User], Utc::now(), Duration::from_secs(60));

    let verified = match authenticator.issue_token(&probe) {
        Ok(token) => authenticator.verify_token(&token).await,
        Err(e) => Err(e),
    };

    match verified {
        Ok(_) => CheckStatus::ok(format!("Active key id: {}", authenticator.active_kid())),
        Err(e) => CheckStatus::error(format!("Signing key check failed: {e}")),
    }
}
