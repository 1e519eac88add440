use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use tower_http::trace::TraceLayer;

use crate::http::MessageResponse;
use crate::state::AppState;
use crate::{auth, maps};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(maps::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis();
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to GeoExplorer API"))
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
