//! Common routes: health, readiness, version.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    data_sources: BTreeMap<String, &'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// 503 when any data source fails its ping.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let mut data_sources = BTreeMap::new();
    let mut healthy = true;
    for (id, source) in state.data_sources.iter() {
        let status = match source.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(data_source = %id, error = %e, "data source unavailable");
                healthy = false;
                "unavailable"
            }
        };
        data_sources.insert(id.clone(), status);
    }
    if healthy {
        (StatusCode::OK, Json(ReadyBody { status: "ok", data_sources }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                data_sources,
            }),
        )
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready, GET /version. Unauthenticated.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
}
