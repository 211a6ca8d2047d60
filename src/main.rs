use std::sync::Arc;

use axum::http::{header, Method};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod game;
mod room;
mod telemetry;
mod util;
mod ws;

use crate::room::manager::RoomRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

async fn healthz() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let state = AppState {
        registry: Arc::new(RoomRegistry::new()),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws::connection::ws_handler))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config::server_addr();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
