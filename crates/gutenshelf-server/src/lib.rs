//! Gutenshelf server: a local pass-through route to the Gutendex catalog.

pub mod error;
pub mod proxy;

use tokio::net::TcpListener;

use gutenshelf_catalog::{CatalogHttp, parse_base_url};
use gutenshelf_core::AppConfig;

pub use error::{ProxyError, ServerError};
pub use proxy::{BOOKS_ROUTE, ProxyState, router};

/// Bind `config.server` and serve until Ctrl-C.
pub async fn serve(config: &AppConfig) -> Result<(), ServerError> {
    let http = CatalogHttp::new(config.request_timeout(), &config.catalog.user_agent)?;
    let upstream = parse_base_url(&config.catalog.base_url)?;
    let app = router(ProxyState::new(http, upstream));

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(%addr, upstream = %config.catalog.base_url, "proxy listening on {BOOKS_ROUTE}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
