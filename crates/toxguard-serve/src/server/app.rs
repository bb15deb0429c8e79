use crate::server::{mock, routes};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the comment form application
pub fn build_form_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index).post(routes::submit))
        .route("/api/score", post(routes::api_score))
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the stub prediction endpoint
pub fn build_mock_app() -> Router {
    Router::new()
        .route("/predict", post(mock::predict))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
