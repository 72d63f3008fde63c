use serde::{Deserialize, Serialize};

use crate::models::book::Book;
use crate::models::search::Pagination;

/// Languages offered by the language filter.
pub const LANGUAGES: [Language; 8] = [
    Language::new("en", "English"),
    Language::new("fr", "French"),
    Language::new("es", "Spanish"),
    Language::new("de", "German"),
    Language::new("it", "Italian"),
    Language::new("pt", "Portuguese"),
    Language::new("nl", "Dutch"),
    Language::new("fi", "Finnish"),
];

/// Subjects offered by the subject filter.
pub const POPULAR_SUBJECTS: [&str; 12] = [
    "Fiction",
    "Science Fiction",
    "Mystery",
    "Romance",
    "History",
    "Philosophy",
    "Poetry",
    "Drama",
    "Adventure",
    "Fantasy",
    "Children's Literature",
    "Biography",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

impl Language {
    pub const fn new(code: &'static str, name: &'static str) -> Self {
        Self { code, name }
    }
}

/// Display name for a language code, falling back to the code itself.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(code))
        .map_or(code, |l| l.name)
}

/// Human name for a download MIME type.
pub fn format_name(mime: &str) -> &str {
    match mime {
        "text/html" => "HTML",
        "application/pdf" => "PDF",
        "text/plain" => "Plain Text",
        "text/plain; charset=us-ascii" => "Text",
        "application/epub+zip" => "EPUB",
        "application/x-mobipocket-ebook" => "MOBI",
        "application/octet-stream" => "Download",
        other => other,
    }
}

// ─── SearchPage ─────────────────────────────────────────────

/// One page of catalog results with normalized pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<Book>,
    pub total_count: u64,
    pub page: u32,
    pub total_pages: u32,
    /// Opaque upstream cursors, only checked for presence.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl SearchPage {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            total_count: self.total_count,
            current_page: self.page,
            total_pages: self.total_pages,
            has_next: self.page < self.total_pages,
            has_previous: self.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("fr"), "French");
        assert_eq!(language_name("FI"), "Finnish");
        assert_eq!(language_name("la"), "la");
    }

    #[test]
    fn test_format_name() {
        assert_eq!(format_name("application/epub+zip"), "EPUB");
        assert_eq!(format_name("image/jpeg"), "image/jpeg");
    }
}
