//! axum server exposing the dashboard page and its JSON API.
//!
//! Every request recomputes the metric from the shared read-only dataset;
//! nothing is mutated after startup.

mod handlers;
mod html;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServeArgs;
use crate::dashboard::Dashboard;
use crate::map::MapRenderer;

pub use html::{format_decimal, format_thousands};

/// Shared state backing the handlers
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub renderer: Arc<MapRenderer>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        let renderer = MapRenderer::from_dataset(dashboard.dataset());
        Self {
            dashboard: Arc::new(dashboard),
            renderer: Arc::new(renderer),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/options", get(handlers::options))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/geojson", get(handlers::geojson))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(args: &ServeArgs, state: AppState) -> Result<()> {
    let addr = args.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        departments = state.dashboard.dataset().len(),
        provenance = state.dashboard.dataset().provenance.as_str(),
        "dashboard listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("HTTP server error")
}
