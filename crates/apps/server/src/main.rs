//! Development proxy for the viewer.
//!
//! Forwards API, tile and icon requests to the backend so a browser host can
//! load everything from one origin, and optionally serves the built frontend.

mod config;
mod proxy;
mod static_files;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ProxyConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub backend_url: String,
    pub static_root: Option<std::path::PathBuf>,
    pub http: reqwest::Client,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = ProxyConfig::from_env();
    let http = reqwest::Client::builder()
        .build()
        .map_err(std::io::Error::other)?;
    let state = AppState {
        backend_url: cfg.backend_url.clone(),
        static_root: cfg.static_root.clone(),
        http,
    };

    info!(
        backend = %cfg.backend_url,
        static_root = ?cfg.static_root,
        "proxy configured"
    );
    let listener = tokio::net::TcpListener::bind(cfg.addr).await?;
    info!("viewer proxy listening on http://{}", cfg.addr);
    axum::serve(listener, router(state)).await
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::PATCH, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/*path", any(proxy::forward))
        .route("/tiles/*path", get(proxy::forward))
        .route("/icons/*path", get(proxy::forward))
        .fallback(static_files::serve_static)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}
