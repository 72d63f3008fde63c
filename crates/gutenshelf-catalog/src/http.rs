use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::error::{CatalogError, Result};

// ─── CatalogHttp ──────────────────────────────────────────────────────────────

/// Plain GET-and-decode client. No retries and no caching: a failed request
/// is reported once and the caller decides whether to ask again.
#[derive(Debug, Clone)]
pub struct CatalogHttp {
    client: reqwest::Client,
}

impl CatalogHttp {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .build()
            .map_err(CatalogError::ClientBuild)?;
        Ok(Self { client })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let text = self.get_text(url.clone()).await?;
        serde_json::from_str(&text).map_err(|e| CatalogError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn get_text(&self, url: Url) -> Result<String> {
        tracing::debug!(%url, "catalog request");
        let url_str = url.to_string();

        let resp = self.client.get(url).send().await.map_err(|source| {
            tracing::warn!(url = %url_str, error = %source, "catalog request failed");
            CatalogError::Transport {
                url: url_str.clone(),
                source,
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(url = %url_str, status = status.as_u16(), "catalog returned error status");
            return Err(CatalogError::Upstream {
                status: status.as_u16(),
                url: url_str,
            });
        }

        resp.text().await.map_err(|source| CatalogError::Transport {
            url: url_str,
            source,
        })
    }
}

/// Parse a configured base URL, rejecting ones that cannot take path segments.
pub fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| CatalogError::InvalidUrl(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(CatalogError::InvalidUrl(base_url.to_string()));
    }
    Ok(url)
}
