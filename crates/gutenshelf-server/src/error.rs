use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use gutenshelf_catalog::CatalogError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Upstream failure as seen by a proxy client: always a 500 with a fixed
/// `error` string and the underlying cause in `details`.
#[derive(Debug)]
pub struct ProxyError {
    pub details: String,
}

impl From<CatalogError> for ProxyError {
    fn from(err: CatalogError) -> Self {
        tracing::error!(error = %err, "proxy request failed");
        Self {
            details: err.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "Failed to fetch books",
            "details": self.details,
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
