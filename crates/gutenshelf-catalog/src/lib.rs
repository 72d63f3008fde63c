//! Gutenshelf catalog: Gutendex client and browse controller.

pub mod browse;
pub mod client;
pub mod error;
pub mod http;
pub mod source;

pub use browse::{BrowseController, BrowseState, FetchTicket, Phase};
pub use client::{GutendexClient, search_query};
pub use error::{CatalogError, Result};
pub use http::{CatalogHttp, parse_base_url};
pub use source::CatalogSource;
