//! Error type shared by the loader, the metric calculator and the web layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] simd_json::Error),

    #[error("unexpected geojson document: {0}")]
    GeoJson(String),

    #[error("{dataset} dataset has no column {column:?}")]
    MissingColumn { dataset: &'static str, column: String },

    #[error("{dataset} dataset column {column:?} holds values that cannot be used as a key")]
    KeyType { dataset: &'static str, column: String },

    #[error("invalid year selector {0:?}, expected YYYY or YYYY-YYYY")]
    InvalidSelector(String),

    #[error("invalid view {0:?}, expected choropleth or bubbles")]
    InvalidView(String),

    #[error("render task failed: {0}")]
    Render(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match self {
            DashboardError::InvalidSelector(_) | DashboardError::InvalidView(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
