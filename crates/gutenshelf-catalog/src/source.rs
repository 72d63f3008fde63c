use async_trait::async_trait;
use futures::future::try_join_all;

use gutenshelf_core::{Book, SearchPage, SearchParameters};

use crate::error::Result;

/// Read-only book catalog. The browse controller and the CLI hold an
/// `Arc<dyn CatalogSource>`, so tests can swap in a scripted fake.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &str;

    /// One page of results for `params`.
    async fn search(&self, params: &SearchParameters) -> Result<SearchPage>;

    async fn get_by_id(&self, id: u32) -> Result<Book>;

    /// Fetch every id concurrently. Any failure fails the whole call; on
    /// success books come back in the order of `ids`.
    async fn get_many(&self, ids: &[u32]) -> Result<Vec<Book>> {
        try_join_all(ids.iter().map(|&id| self.get_by_id(id))).await
    }

    /// Most downloaded books, at most `limit`.
    async fn popular(&self, limit: usize) -> Result<Vec<Book>>;
}
