use crate::types::*;
use crate::AppState;
use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    info!("Admin endpoint listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "issue-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        tracked_windows: state.limiter.tracked_sessions(),
        throttle: state.limiter.throttle(),
        period_ms: state.limiter.period().as_millis() as u64,
    })
}
