use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShelfError;

/// Fixed page size requested from the catalog.
pub const DEFAULT_PAGE_SIZE: u32 = 32;

/// Page buttons a pagination control shows at once.
pub const DEFAULT_VISIBLE_PAGES: u32 = 5;

// ─── SortOrder ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Popular,
    Title,
    Newest,
    Downloads,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Popular,
        SortOrder::Title,
        SortOrder::Newest,
        SortOrder::Downloads,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Popular => "popular",
            SortOrder::Title => "title",
            SortOrder::Newest => "newest",
            SortOrder::Downloads => "downloads",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Popular => "Most Popular",
            SortOrder::Title => "Title A-Z",
            SortOrder::Newest => "Newest First",
            SortOrder::Downloads => "Most Downloads",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ShelfError::UnknownSortOrder(s.to_string()))
    }
}

// ─── SearchParameters ───────────────────────────────────────

/// Current query of a list view. `page` is always >= 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParameters {
    pub search: String,
    pub page: u32,
    /// Language codes, sent comma-joined. Empty means no filter.
    pub languages: Vec<String>,
    pub topic: Option<String>,
    pub sort: SortOrder,
    pub copyright: Option<bool>,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            languages: Vec::new(),
            topic: None,
            sort: SortOrder::default(),
            copyright: None,
        }
    }
}

impl SearchParameters {
    pub fn with_search(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Self::default()
        }
    }

    /// Trimmed search text, `None` when blank.
    pub fn search_query(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Comma-joined language codes, `None` when no language is selected.
    pub fn languages_param(&self) -> Option<String> {
        (!self.languages.is_empty()).then(|| self.languages.join(","))
    }

    /// Topic with surrounding whitespace removed, `None` when blank.
    pub fn topic_param(&self) -> Option<&str> {
        self.topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Merge a partial update. Unless the update sets `page` explicitly the
    /// page goes back to 1, so a new filter never runs against a stale page.
    pub fn apply(&mut self, update: ParamsUpdate) {
        let ParamsUpdate {
            search,
            page,
            languages,
            topic,
            sort,
            copyright,
        } = update;

        if let Some(search) = search {
            self.search = search;
        }
        if let Some(languages) = languages {
            self.languages = normalize_languages(languages);
        }
        if let Some(topic) = topic {
            self.topic = topic.filter(|t| !t.trim().is_empty());
        }
        if let Some(sort) = sort {
            self.sort = sort;
        }
        if let Some(copyright) = copyright {
            self.copyright = copyright;
        }
        self.page = page.unwrap_or(1).max(1);
    }
}

/// Lowercased, trimmed, de-duplicated codes in first-seen order.
fn normalize_languages(languages: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(languages.len());
    for code in languages
        .iter()
        .flat_map(|l| l.split(','))
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
    {
        if !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

// ─── ParamsUpdate ───────────────────────────────────────────

/// Partial update for [`SearchParameters`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamsUpdate {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub languages: Option<Vec<String>>,
    /// `Some(None)` clears the topic.
    pub topic: Option<Option<String>>,
    pub sort: Option<SortOrder>,
    /// `Some(None)` clears the copyright filter.
    pub copyright: Option<Option<bool>>,
}

impl ParamsUpdate {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn languages<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: Some(codes.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn topic(topic: Option<String>) -> Self {
        Self {
            topic: Some(topic),
            ..Self::default()
        }
    }

    pub fn sort(sort: SortOrder) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    pub fn copyright(copyright: Option<bool>) -> Self {
        Self {
            copyright: Some(copyright),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

// ─── Pagination ─────────────────────────────────────────────

/// Derived paging info, recomputed on every successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total_count: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_count(0, 1, DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn from_count(total_count: u64, current_page: u32, page_size: u32) -> Self {
        let total_pages = total_pages(total_count, page_size);
        let current_page = current_page.max(1);
        Self {
            total_count,
            current_page,
            total_pages,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        }
    }

    pub fn contains_page(&self, page: u32) -> bool {
        (1..=self.total_pages).contains(&page)
    }

    /// Page numbers a pagination control shows: a window of at most
    /// `max_visible` pages around the current one, shifted at the edges.
    pub fn page_window(&self, max_visible: u32) -> RangeInclusive<u32> {
        let total = self.total_pages.max(1);
        let max_visible = max_visible.clamp(1, total);
        let current = self.current_page.clamp(1, total);
        let mut start = current.saturating_sub(max_visible / 2).max(1);
        let end = start.saturating_add(max_visible - 1).min(total);
        if end - start + 1 < max_visible {
            start = end.saturating_sub(max_visible - 1).max(1);
        }
        start..=end
    }
}

/// `max(1, ceil(total_count / page_size))`.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_never_below_one() {
        assert_eq!(total_pages(0, 32), 1);
        assert_eq!(total_pages(1, 32), 1);
        assert_eq!(total_pages(32, 32), 1);
        assert_eq!(total_pages(33, 32), 2);
        assert_eq!(total_pages(100, 32), 4);
        assert_eq!(total_pages(10, 0), 10);
    }

    #[test]
    fn test_total_pages_matches_ceil_for_many_counts() {
        for count in 0..500u64 {
            let expected = ((count as f64) / 32.0).ceil().max(1.0) as u32;
            assert_eq!(total_pages(count, 32), expected, "count = {count}");
        }
    }

    #[test]
    fn test_update_without_page_resets_to_first_page() {
        let mut params = SearchParameters {
            page: 3,
            ..SearchParameters::default()
        };
        params.apply(ParamsUpdate::search("dracula"));
        assert_eq!(params.page, 1);
        assert_eq!(params.search, "dracula");

        params.page = 5;
        params.apply(ParamsUpdate::languages(["fr"]));
        assert_eq!(params.page, 1);

        params.page = 5;
        params.apply(ParamsUpdate::topic(Some("horror".into())));
        assert_eq!(params.page, 1);

        params.page = 5;
        params.apply(ParamsUpdate::sort(SortOrder::Newest));
        assert_eq!(params.page, 1);

        params.page = 5;
        params.apply(ParamsUpdate::copyright(Some(false)));
        assert_eq!(params.page, 1);
    }

    #[test]
    fn test_explicit_page_is_kept() {
        let mut params = SearchParameters::with_search("war");
        params.apply(ParamsUpdate::page(4));
        assert_eq!(params.page, 4);
        assert_eq!(params.search, "war");

        params.apply(ParamsUpdate::search("peace").with_page(2));
        assert_eq!(params.page, 2);

        params.apply(ParamsUpdate::page(0));
        assert_eq!(params.page, 1);
    }

    #[test]
    fn test_languages_are_normalized() {
        let mut params = SearchParameters::default();
        params.apply(ParamsUpdate::languages(["EN", " fr", "en", "de,fi", ""]));
        assert_eq!(params.languages, vec!["en", "fr", "de", "fi"]);
        assert_eq!(params.languages_param().as_deref(), Some("en,fr,de,fi"));

        params.apply(ParamsUpdate::languages(Vec::<String>::new()));
        assert_eq!(params.languages_param(), None);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let mut params = SearchParameters::with_search("   ");
        assert_eq!(params.search_query(), None);
        params.apply(ParamsUpdate::topic(Some("  ".into())));
        assert_eq!(params.topic, None);
        assert_eq!(params.topic_param(), None);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("Title".parse::<SortOrder>().unwrap(), SortOrder::Title);
        assert_eq!("newest".parse::<SortOrder>().unwrap(), SortOrder::Newest);
        assert!("random".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_pagination_flags() {
        let p = Pagination::from_count(100, 1, 32);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next);
        assert!(!p.has_previous);

        let last = Pagination::from_count(100, 4, 32);
        assert!(!last.has_next);
        assert!(last.has_previous);

        let empty = Pagination::default();
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
        assert!(!empty.contains_page(0));
        assert!(empty.contains_page(1));
        assert!(!empty.contains_page(2));
    }

    #[test]
    fn test_page_window() {
        let at = |page, total_count| Pagination::from_count(total_count, page, 10);
        assert_eq!(at(1, 100).page_window(5), 1..=5);
        assert_eq!(at(5, 100).page_window(5), 3..=7);
        assert_eq!(at(10, 100).page_window(5), 6..=10);
        assert_eq!(at(2, 30).page_window(5), 1..=3);
        assert_eq!(at(1, 0).page_window(5), 1..=1);
    }

    #[test]
    fn test_page_window_with_huge_width() {
        let p = Pagination::from_count(100, 5, 10);
        assert_eq!(p.page_window(u32::MAX), 1..=10);

        let last = Pagination {
            total_count: u64::MAX,
            current_page: u32::MAX,
            total_pages: u32::MAX,
            has_next: false,
            has_previous: true,
        };
        assert_eq!(last.page_window(u32::MAX), 1..=u32::MAX);
        assert_eq!(last.page_window(3), u32::MAX - 2..=u32::MAX);
    }
}
