use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request never produced a response: DNS, connect, timeout, reset.
    #[error("network error requesting {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("catalog returned HTTP {status} for {url}")]
    Upstream { status: u16, url: String },

    #[error("book {id} not found")]
    NotFound { id: u32 },

    #[error("could not decode catalog response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid catalog URL {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    /// HTTP status for upstream failures, `None` for transport-level ones.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Upstream { status, .. } => Some(*status),
            CatalogError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, CatalogError::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
