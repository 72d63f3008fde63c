use gutenshelf_core::{Book, Pagination, ParamsUpdate, SearchPage, SearchParameters, SortOrder};

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl Phase {
    /// `Ready` or `Failed`: nothing newer is in flight.
    pub fn is_settled(self) -> bool {
        matches!(self, Phase::Ready | Phase::Failed)
    }
}

/// Issued for every fetch. Its result is applied only while `version` is
/// still the latest one handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub version: u64,
    pub params: SearchParameters,
}

/// View state of a paginated book list.
///
/// Pure bookkeeping: it hands out [`FetchTicket`]s and accepts their
/// outcomes, but performs no I/O itself.
#[derive(Debug)]
pub struct BrowseState {
    params: SearchParameters,
    phase: Phase,
    books: Vec<Book>,
    pagination: Pagination,
    error: Option<CatalogError>,
    subject_filter: Vec<String>,
    latest_version: u64,
}

impl BrowseState {
    pub fn new(params: SearchParameters) -> Self {
        let mut params = params;
        params.page = params.page.max(1);
        Self {
            pagination: Pagination {
                current_page: params.page,
                ..Pagination::default()
            },
            params,
            phase: Phase::Idle,
            books: Vec::new(),
            error: None,
            subject_filter: Vec::new(),
            latest_version: 0,
        }
    }

    // ─── Transitions ─────────────────────────────────────────

    /// Enter `Loading` for the current parameters under a fresh version.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_version += 1;
        self.phase = Phase::Loading;
        self.error = None;
        FetchTicket {
            version: self.latest_version,
            params: self.params.clone(),
        }
    }

    /// Merge `update` (page resets to 1 unless set) and start a fetch.
    ///
    /// When anything besides the page changes, the stored pagination
    /// belongs to another query, so it is dropped until the new one loads.
    pub fn update_parameters(&mut self, update: ParamsUpdate) -> FetchTicket {
        let previous = self.params.clone();
        self.params.apply(update);
        if !same_query(&previous, &self.params) {
            self.pagination = Pagination {
                current_page: self.params.page,
                ..Pagination::default()
            };
        }
        self.begin_fetch()
    }

    /// `None`, with nothing changed, when `page` is outside `1..=total_pages`.
    pub fn go_to_page(&mut self, page: u32) -> Option<FetchTicket> {
        if !self.pagination.contains_page(page) {
            return None;
        }
        Some(self.update_parameters(ParamsUpdate::page(page)))
    }

    /// Page after the requested one, if the current query has it.
    pub fn next_page(&mut self) -> Option<FetchTicket> {
        let target = self.params.page.checked_add(1)?;
        self.go_to_page(target)
    }

    pub fn previous_page(&mut self) -> Option<FetchTicket> {
        let target = self.params.page.checked_sub(1)?;
        self.go_to_page(target)
    }

    /// Refetch the current parameters (user-initiated retry).
    pub fn reload(&mut self) -> FetchTicket {
        self.begin_fetch()
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.version == self.latest_version
    }

    /// Store a successful page. Returns `false` for a stale ticket, which
    /// leaves the state untouched.
    pub fn apply_success(&mut self, ticket: &FetchTicket, page: SearchPage) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                version = ticket.version,
                latest = self.latest_version,
                "dropping stale search result"
            );
            return false;
        }

        let pagination = page.pagination();
        let mut books = page.items;
        if ticket.params.sort == SortOrder::Title {
            books.sort_by_cached_key(|b| b.title.to_lowercase());
        }

        self.books = books;
        self.pagination = pagination;
        self.error = None;
        self.phase = Phase::Ready;
        true
    }

    /// Record a failed fetch: books are cleared so stale results never
    /// show next to the error. Returns `false` for a stale ticket.
    pub fn apply_failure(&mut self, ticket: &FetchTicket, error: CatalogError) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                version = ticket.version,
                latest = self.latest_version,
                error = %error,
                "dropping stale search failure"
            );
            return false;
        }

        tracing::warn!(error = %error, "search failed");
        self.books.clear();
        self.error = Some(error);
        self.phase = Phase::Failed;
        true
    }

    /// Narrow the visible books to those matching any of `subjects`.
    /// Applied locally; never triggers a fetch or touches the page.
    pub fn set_subject_filter(&mut self, subjects: Vec<String>) {
        self.subject_filter = subjects
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // ─── Accessors ───────────────────────────────────────────

    pub fn params(&self) -> &SearchParameters {
        &self.params
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// All books of the current page.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Books of the current page that pass the subject filter.
    pub fn visible_books(&self) -> Vec<&Book> {
        self.books
            .iter()
            .filter(|b| {
                self.subject_filter.is_empty()
                    || self.subject_filter.iter().any(|s| b.matches_subject(s))
            })
            .collect()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn error(&self) -> Option<&CatalogError> {
        self.error.as_ref()
    }

    pub fn subject_filter(&self) -> &[String] {
        &self.subject_filter
    }

    pub fn latest_version(&self) -> u64 {
        self.latest_version
    }
}

/// Equal apart from the page number.
fn same_query(a: &SearchParameters, b: &SearchParameters) -> bool {
    a.search == b.search
        && a.languages == b.languages
        && a.topic == b.topic
        && a.sort == b.sort
        && a.copyright == b.copyright
}

#[cfg(test)]
mod tests {
    use super::*;
    use gutenshelf_core::{Person, total_pages};

    fn book(id: u32, title: &str, subjects: &[&str]) -> Book {
        Book {
            id,
            title: title.to_string(),
            authors: vec![Person {
                name: "Someone".into(),
                ..Default::default()
            }],
            translators: Vec::new(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            bookshelves: Vec::new(),
            languages: vec!["en".into()],
            formats: Default::default(),
            download_count: 0,
            copyright: Some(false),
            media_type: None,
        }
    }

    fn page(ticket: &FetchTicket, total_count: u64, items: Vec<Book>) -> SearchPage {
        SearchPage {
            items,
            total_count,
            page: ticket.params.page,
            total_pages: total_pages(total_count, 32),
            next: None,
            previous: None,
        }
    }

    fn ready_state(total_count: u64) -> BrowseState {
        let mut state = BrowseState::new(SearchParameters::default());
        let t = state.begin_fetch();
        assert!(state.apply_success(&t, page(&t, total_count, vec![book(1, "A", &[])])));
        state
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = BrowseState::new(SearchParameters {
            page: 0,
            ..SearchParameters::default()
        });
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.params().page, 1);
        assert_eq!(state.pagination().total_pages, 1);
    }

    #[test]
    fn test_success_replaces_books_and_pagination() {
        let state = ready_state(100);
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.books().len(), 1);
        assert_eq!(state.pagination().total_pages, 4);
        assert!(state.pagination().has_next);
    }

    #[test]
    fn test_go_to_page_out_of_range_is_noop() {
        let mut state = ready_state(100);
        let version = state.latest_version();
        let params = state.params().clone();

        assert!(state.go_to_page(0).is_none());
        assert!(state.go_to_page(5).is_none());
        assert_eq!(state.latest_version(), version);
        assert_eq!(state.params(), &params);
        assert_eq!(state.phase(), Phase::Ready);

        let ticket = state.go_to_page(4).unwrap();
        assert_eq!(ticket.params.page, 4);
        assert_eq!(state.phase(), Phase::Loading);
    }

    #[test]
    fn test_parameter_change_resets_page() {
        let mut state = ready_state(100);
        let t = state.go_to_page(3).unwrap();
        state.apply_success(&t, page(&t, 100, Vec::new()));
        assert_eq!(state.params().page, 3);

        let t = state.update_parameters(ParamsUpdate::search("dracula"));
        assert_eq!(t.params.page, 1);
        assert_eq!(t.params.search, "dracula");
    }

    #[test]
    fn test_stale_success_is_dropped() {
        let mut state = BrowseState::new(SearchParameters::default());
        let a = state.update_parameters(ParamsUpdate::search("a"));
        let b = state.update_parameters(ParamsUpdate::search("b"));

        assert!(state.apply_success(&b, page(&b, 1, vec![book(2, "B", &[])])));
        assert!(!state.apply_success(&a, page(&a, 64, vec![book(1, "A", &[])])));

        assert_eq!(state.books()[0].id, 2);
        assert_eq!(state.pagination().total_count, 1);
    }

    #[test]
    fn test_stale_failure_is_dropped() {
        let mut state = BrowseState::new(SearchParameters::default());
        let a = state.begin_fetch();
        let b = state.begin_fetch();
        assert!(state.apply_success(&b, page(&b, 1, vec![book(2, "B", &[])])));
        assert!(!state.apply_failure(&a, CatalogError::Upstream {
            status: 500,
            url: "x".into()
        }));
        assert_eq!(state.phase(), Phase::Ready);
        assert!(state.error().is_none());
    }

    #[test]
    fn test_failure_clears_books_and_keeps_error() {
        let mut state = ready_state(100);
        let t = state.reload();
        assert!(state.apply_failure(&t, CatalogError::Upstream {
            status: 503,
            url: "x".into()
        }));
        assert_eq!(state.phase(), Phase::Failed);
        assert!(state.books().is_empty());
        assert_eq!(state.error().and_then(|e| e.status()), Some(503));

        // Retry clears the error and loads again.
        let t = state.reload();
        assert!(state.error().is_none());
        assert_eq!(state.phase(), Phase::Loading);
        state.apply_success(&t, page(&t, 1, vec![book(1, "A", &[])]));
        assert_eq!(state.phase(), Phase::Ready);
    }

    #[test]
    fn test_next_and_previous_page() {
        let mut state = ready_state(40);
        assert!(state.previous_page().is_none());

        let t = state.next_page().unwrap();
        assert_eq!(t.params.page, 2);
        state.apply_success(&t, page(&t, 40, Vec::new()));
        assert!(state.next_page().is_none());

        let t = state.previous_page().unwrap();
        assert_eq!(t.params.page, 1);
    }

    #[test]
    fn test_no_paging_while_new_query_loads() {
        let mut state = ready_state(100);
        let t = state.go_to_page(3).unwrap();
        state.apply_success(&t, page(&t, 100, Vec::new()));

        state.update_parameters(ParamsUpdate::languages(["fr"]));
        assert_eq!(state.phase(), Phase::Loading);
        assert_eq!(state.pagination().total_pages, 1);
        assert!(state.next_page().is_none());
        assert!(state.previous_page().is_none());
        assert!(state.go_to_page(2).is_none());
        assert_eq!(state.params().page, 1);
    }

    #[test]
    fn test_no_paging_after_new_query_fails() {
        let mut state = ready_state(100);
        let t = state.go_to_page(3).unwrap();
        state.apply_success(&t, page(&t, 100, Vec::new()));

        let t = state.update_parameters(ParamsUpdate::search("boom"));
        state.apply_failure(&t, CatalogError::Upstream {
            status: 500,
            url: "x".into()
        });
        assert!(state.next_page().is_none());
        assert_eq!(state.params().page, 1);

        // Once the query loads, paging starts from its own page 1.
        let t = state.reload();
        state.apply_success(&t, page(&t, 100, Vec::new()));
        assert_eq!(state.next_page().unwrap().params.page, 2);
    }

    #[test]
    fn test_page_change_keeps_pagination_while_loading() {
        let mut state = ready_state(100);
        state.go_to_page(2).unwrap();
        assert_eq!(state.phase(), Phase::Loading);

        let t = state.next_page().unwrap();
        assert_eq!(t.params.page, 3);
        assert_eq!(state.pagination().total_pages, 4);
    }

    #[test]
    fn test_title_sort_is_applied_locally() {
        let mut state = BrowseState::new(SearchParameters::default());
        let t = state.update_parameters(ParamsUpdate::sort(SortOrder::Title));
        let items = vec![
            book(1, "war and peace", &[]),
            book(2, "Anna Karenina", &[]),
            book(3, "Dead Souls", &[]),
        ];
        state.apply_success(&t, page(&t, 3, items));
        let titles: Vec<_> = state.books().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Anna Karenina", "Dead Souls", "war and peace"]);
    }

    #[test]
    fn test_subject_filter_is_local() {
        let mut state = BrowseState::new(SearchParameters::default());
        let t = state.begin_fetch();
        state.apply_success(
            &t,
            page(
                &t,
                3,
                vec![
                    book(1, "Dracula", &["Horror tales"]),
                    book(2, "Emma", &["Romance"]),
                    book(3, "Frankenstein", &["Science fiction", "Horror tales"]),
                ],
            ),
        );
        let version = state.latest_version();

        state.set_subject_filter(vec!["horror".into(), " ".into()]);
        let ids: Vec<_> = state.visible_books().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(state.latest_version(), version);
        assert_eq!(state.books().len(), 3);

        state.set_subject_filter(Vec::new());
        assert_eq!(state.visible_books().len(), 3);
    }
}
