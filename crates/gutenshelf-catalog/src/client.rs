use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use gutenshelf_core::{Book, CatalogConfig, SearchPage, SearchParameters, SortOrder, total_pages};

use crate::error::{CatalogError, Result};
use crate::http::{CatalogHttp, parse_base_url};
use crate::source::CatalogSource;

/// Raw list response from the catalog.
#[derive(Debug, Deserialize)]
struct BookList {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    previous: Option<String>,
    #[serde(default)]
    results: Vec<Book>,
}

/// Gutendex client.
#[derive(Debug, Clone)]
pub struct GutendexClient {
    http: CatalogHttp,
    base_url: Url,
    page_size: u32,
}

impl GutendexClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let http = CatalogHttp::new(
            std::time::Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )?;
        Ok(Self {
            http,
            base_url: parse_base_url(&config.base_url)?,
            page_size: config.page_size.max(1),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List URL for `params`. Only meaningful parameters are sent because
    /// the catalog treats a present parameter as an active filter.
    pub fn search_url(&self, params: &SearchParameters) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in search_query(params, self.page_size) {
                query.append_pair(key, &value);
            }
        }
        url
    }

    /// `{base}/{id}/`
    pub fn book_url(&self, id: u32) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&id.to_string())
            .push("");
        Ok(url)
    }
}

/// Query pairs for a list request, in a fixed order. Blank search, page 1,
/// and unset filters are left out. `limit` is always present.
pub fn search_query(params: &SearchParameters, page_size: u32) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(search) = params.search_query() {
        pairs.push(("search", search.to_string()));
    }
    if params.page > 1 {
        pairs.push(("page", params.page.to_string()));
    }
    if let Some(languages) = params.languages_param() {
        pairs.push(("languages", languages));
    }
    if let Some(topic) = params.topic_param() {
        pairs.push(("topic", topic.to_string()));
    }
    if let Some(copyright) = params.copyright {
        pairs.push(("copyright", copyright.to_string()));
    }
    if let Some(sort) = upstream_sort(params.sort) {
        pairs.push(("sort", sort.to_string()));
    }
    pairs.push(("limit", page_size.to_string()));
    pairs
}

/// Catalog sort value for an order, `None` when the catalog default
/// (popularity) already gives it. `Title` is sorted locally.
fn upstream_sort(sort: SortOrder) -> Option<&'static str> {
    match sort {
        SortOrder::Newest => Some("descending"),
        SortOrder::Popular | SortOrder::Downloads | SortOrder::Title => None,
    }
}

#[async_trait]
impl CatalogSource for GutendexClient {
    fn name(&self) -> &str {
        "gutendex"
    }

    async fn search(&self, params: &SearchParameters) -> Result<SearchPage> {
        let url = self.search_url(params);
        let list: BookList = self.http.get_json(url).await?;
        let page = params.page.max(1);

        Ok(SearchPage {
            total_pages: total_pages(list.count, self.page_size),
            total_count: list.count,
            page,
            items: list.results,
            next: list.next,
            previous: list.previous,
        })
    }

    async fn get_by_id(&self, id: u32) -> Result<Book> {
        let url = self.book_url(id)?;
        match self.http.get_json(url).await {
            Err(CatalogError::Upstream { status: 404, .. }) => Err(CatalogError::NotFound { id }),
            other => other,
        }
    }

    async fn popular(&self, limit: usize) -> Result<Vec<Book>> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("sort", "popular")
            .append_pair("limit", &limit.to_string());

        let list: BookList = self.http.get_json(url).await?;
        let mut books = list.results;
        books.truncate(limit);
        Ok(books)
    }
}
