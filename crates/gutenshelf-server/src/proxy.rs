use axum::{
    Router,
    extract::{RawQuery, State},
    http::{HeaderName, HeaderValue, header},
    response::IntoResponse,
    routing::get,
};
use reqwest::Url;
use serde::de::IgnoredAny;
use tower_http::trace::TraceLayer;

use gutenshelf_catalog::{CatalogError, CatalogHttp};

use crate::error::ProxyError;

pub const BOOKS_ROUTE: &str = "/api/books";

const CORS_HEADERS: [(HeaderName, HeaderValue); 3] = [
    (
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    ),
    (
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    ),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    ),
];

#[derive(Debug, Clone)]
pub struct ProxyState {
    http: CatalogHttp,
    upstream: Url,
}

impl ProxyState {
    pub fn new(http: CatalogHttp, upstream: Url) -> Self {
        Self { http, upstream }
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    /// Upstream list URL carrying the caller's query string untouched.
    fn upstream_url(&self, raw_query: Option<&str>) -> Url {
        let mut url = self.upstream.clone();
        url.set_query(raw_query.filter(|q| !q.is_empty()));
        url
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(BOOKS_ROUTE, get(list_books).options(preflight))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_books(
    State(state): State<ProxyState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ProxyError> {
    let url = state.upstream_url(query.as_deref());
    let body = state.http.get_text(url.clone()).await?;
    // Pass the body through byte for byte, but only if it is JSON.
    serde_json::from_str::<IgnoredAny>(&body).map_err(|e| CatalogError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok((
        CORS_HEADERS,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    ))
}

async fn preflight() -> impl IntoResponse {
    CORS_HEADERS
}
