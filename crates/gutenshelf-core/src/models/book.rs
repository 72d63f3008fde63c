use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Download formats shown on a book card, in display order.
pub const PRIORITY_FORMATS: [&str; 5] = [
    "text/html",
    "application/pdf",
    "application/epub+zip",
    "text/plain",
    "application/x-mobipocket-ebook",
];

/// Formats preferred for the single "download" link.
const PREFERRED_DOWNLOADS: [&str; 4] = [
    "application/pdf",
    "text/html",
    "application/epub+zip",
    "text/plain",
];

const COVER_FORMAT: &str = "image/jpeg";

/// Subjects this long or longer are hidden from cards.
const MAX_SUBJECT_CHARS: usize = 50;

pub const DEFAULT_SUBJECT_LIMIT: usize = 5;

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

// ─── Book ───────────────────────────────────────────────────

/// A single catalog entry as returned by the upstream catalog.
///
/// Books are read-only: they are re-fetched or dropped, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: u32,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub authors: Vec<Person>,

    #[serde(default)]
    pub translators: Vec<Person>,

    #[serde(default)]
    pub subjects: Vec<String>,

    #[serde(default)]
    pub bookshelves: Vec<String>,

    #[serde(default)]
    pub languages: Vec<String>,

    /// MIME type -> resource URL. No key is guaranteed.
    #[serde(default)]
    pub formats: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "null_as_zero")]
    pub download_count: u64,

    #[serde(default)]
    pub copyright: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Book {
    /// Name of the first author, or a placeholder.
    pub fn primary_author(&self) -> &str {
        self.authors
            .first()
            .map(|a| a.name.as_str())
            .unwrap_or(UNKNOWN_AUTHOR)
    }

    /// All author names joined for display.
    pub fn author_names(&self) -> String {
        if self.authors.is_empty() {
            return UNKNOWN_AUTHOR.to_string();
        }
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Priority formats this book actually offers, in priority order.
    pub fn available_formats(&self) -> Vec<&'static str> {
        PRIORITY_FORMATS
            .iter()
            .copied()
            .filter(|mime| self.formats.contains_key(*mime))
            .collect()
    }

    /// Best single download link: a preferred format if present, otherwise
    /// the first format in map order.
    pub fn best_download_link(&self) -> Option<&str> {
        PREFERRED_DOWNLOADS
            .iter()
            .find_map(|mime| self.formats.get(*mime))
            .or_else(|| self.formats.values().next())
            .map(String::as_str)
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.formats.get(COVER_FORMAT).map(String::as_str)
    }

    /// Subjects short enough for a card, at most `limit` of them.
    pub fn display_subjects(&self, limit: usize) -> Vec<&str> {
        self.subjects
            .iter()
            .filter(|s| s.chars().count() < MAX_SUBJECT_CHARS)
            .take(limit)
            .map(String::as_str)
            .collect()
    }

    /// Case-insensitive match against subjects and bookshelves.
    pub fn matches_subject(&self, subject: &str) -> bool {
        let needle = subject.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.subjects
            .iter()
            .chain(self.bookshelves.iter())
            .any(|tag| tag.to_lowercase().contains(&needle))
    }

    /// Upstream page for this book on Project Gutenberg.
    pub fn gutenberg_url(&self) -> String {
        format!("https://www.gutenberg.org/ebooks/{}", self.id)
    }
}

// ─── Person ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,

    #[serde(default)]
    pub birth_year: Option<i32>,

    #[serde(default)]
    pub death_year: Option<i32>,
}

impl Person {
    /// `"(1847 - 1912)"`, with `?` for unknown years.
    pub fn life_years(&self) -> String {
        let fmt = |year: Option<i32>| year.map_or_else(|| "?".to_string(), |y| y.to_string());
        format!("({} - {})", fmt(self.birth_year), fmt(self.death_year))
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dracula() -> Book {
        serde_json::from_value(json!({
            "id": 345,
            "title": "Dracula",
            "authors": [{"name": "Stoker, Bram", "birth_year": 1847, "death_year": 1912}],
            "subjects": [
                "Horror tales",
                "Vampires -- Fiction",
                "Epistolary fiction with a very long subject heading that nobody reads"
            ],
            "bookshelves": ["Gothic Fiction", "Movie Books"],
            "languages": ["en"],
            "copyright": false,
            "media_type": "Text",
            "formats": {
                "text/html": "https://www.gutenberg.org/ebooks/345.html.images",
                "application/epub+zip": "https://www.gutenberg.org/ebooks/345.epub3.images",
                "image/jpeg": "https://www.gutenberg.org/cache/epub/345/pg345.cover.medium.jpg"
            },
            "download_count": 51234
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_minimal_book() {
        let book: Book = serde_json::from_value(json!({"id": 7, "title": "Bare"})).unwrap();
        assert_eq!(book.download_count, 0);
        assert!(book.formats.is_empty());
        assert_eq!(book.copyright, None);
        assert_eq!(book.primary_author(), UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_null_download_count_is_zero() {
        let book: Book =
            serde_json::from_value(json!({"id": 7, "title": "X", "download_count": null}))
                .unwrap();
        assert_eq!(book.download_count, 0);
    }

    #[test]
    fn test_available_formats_priority_order() {
        let book = dracula();
        assert_eq!(
            book.available_formats(),
            vec!["text/html", "application/epub+zip"]
        );
    }

    #[test]
    fn test_best_download_link_prefers_html_over_epub_without_pdf() {
        let book = dracula();
        assert_eq!(
            book.best_download_link(),
            Some("https://www.gutenberg.org/ebooks/345.html.images")
        );
    }

    #[test]
    fn test_best_download_link_falls_back_to_any_format() {
        let mut formats = BTreeMap::new();
        formats.insert("application/rdf+xml".to_string(), "rdf".to_string());
        let book = Book {
            formats,
            ..dracula()
        };
        assert_eq!(book.best_download_link(), Some("rdf"));

        let empty = Book {
            formats: BTreeMap::new(),
            ..dracula()
        };
        assert_eq!(empty.best_download_link(), None);
    }

    #[test]
    fn test_display_subjects_hides_long_ones() {
        let book = dracula();
        assert_eq!(
            book.display_subjects(DEFAULT_SUBJECT_LIMIT),
            vec!["Horror tales", "Vampires -- Fiction"]
        );
        assert_eq!(book.display_subjects(1), vec!["Horror tales"]);
    }

    #[test]
    fn test_matches_subject_checks_bookshelves() {
        let book = dracula();
        assert!(book.matches_subject("gothic"));
        assert!(book.matches_subject("VAMPIRES"));
        assert!(!book.matches_subject("Romance"));
    }

    #[test]
    fn test_life_years() {
        let book = dracula();
        assert_eq!(book.authors[0].life_years(), "(1847 - 1912)");
        let anon = Person {
            name: "Anonymous".into(),
            ..Default::default()
        };
        assert_eq!(anon.life_years(), "(? - ?)");
    }

    #[test]
    fn test_cover_url() {
        assert!(dracula().cover_url().unwrap().ends_with("cover.medium.jpg"));
    }
}
