/// Health check endpoint
///
/// Reports database connectivity and, when configured, whether the
/// enrichment service answers. Enrichment being down only degrades matching
/// and resume parsing, so it never makes the service unhealthy.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "enrichment": "disabled"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    /// Application version
    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,

    /// "connected", "disconnected" or "disabled"
    pub enrichment: String,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_connected = talentgrid_shared::db::pool::health_check(&state.db)
        .await
        .is_ok();

    let enrichment = match &state.enrichment {
        Some(client) if client.health().await => "connected",
        Some(_) => "disconnected",
        None => "disabled",
    };

    Ok(Json(HealthResponse {
        status: if database_connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_connected {
            "connected"
        } else {
            "disconnected"
        }
        .to_string(),
        enrichment: enrichment.to_string(),
    }))
}
