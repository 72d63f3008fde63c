use std::time::Instant;

use anyhow::Result;
use serde_json::{Value, json};

use gutenshelf_core::display::{DEFAULT_TRUNCATE, format_number, truncate_text};
use gutenshelf_core::{
    Book, DEFAULT_SUBJECT_LIMIT, DEFAULT_VISIBLE_PAGES, Pagination, format_name, language_name,
};

const TITLE_WIDTH: usize = 48;
const AUTHOR_WIDTH: usize = 28;

pub fn print_json(val: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

pub fn ok(data: Value, start: Instant) -> Value {
    json!({
        "status": "ok",
        "data": data,
        "meta": { "duration_ms": start.elapsed().as_millis() as u64 }
    })
}

pub fn error(kind: &str, message: &str) -> Value {
    json!({ "status": "error", "error": kind, "message": message })
}

/// One row of a book list.
pub fn book_line(book: &Book, favorite: bool) -> String {
    let marker = if favorite { '*' } else { ' ' };
    format!(
        "{marker} {id:>6}  {title:<tw$}  {author:<aw$}  {downloads:>9}",
        id = book.id,
        title = truncate_text(&book.title, TITLE_WIDTH),
        author = truncate_text(book.primary_author(), AUTHOR_WIDTH),
        downloads = format_number(book.download_count),
        tw = TITLE_WIDTH,
        aw = AUTHOR_WIDTH,
    )
}

pub fn book_detail(book: &Book, favorite: bool) -> String {
    let mut out = vec![format!(
        "{}{}",
        book.title,
        if favorite { "  [favorite]" } else { "" }
    )];

    for author in &book.authors {
        out.push(format!("  by {} {}", author.name, author.life_years()));
    }
    if book.authors.is_empty() {
        out.push(format!("  by {}", book.primary_author()));
    }
    for translator in &book.translators {
        out.push(format!("  translated by {}", translator.name));
    }

    out.push(String::new());
    out.push(format!("  id:         {}", book.id));
    out.push(format!("  downloads:  {}", format_number(book.download_count)));
    if !book.languages.is_empty() {
        let langs: Vec<_> = book.languages.iter().map(|l| language_name(l)).collect();
        out.push(format!("  languages:  {}", langs.join(", ")));
    }
    if let Some(copyright) = book.copyright {
        let label = if copyright { "yes" } else { "public domain" };
        out.push(format!("  copyright:  {label}"));
    }

    let subjects = book.display_subjects(DEFAULT_SUBJECT_LIMIT);
    if !subjects.is_empty() {
        out.push(format!(
            "  subjects:   {}",
            truncate_text(&subjects.join("; "), DEFAULT_TRUNCATE)
        ));
    }
    if !book.bookshelves.is_empty() {
        out.push(format!("  shelves:    {}", book.bookshelves.join("; ")));
    }

    let formats: Vec<_> = book.available_formats().into_iter().map(format_name).collect();
    if !formats.is_empty() {
        out.push(format!("  formats:    {}", formats.join(", ")));
    }
    if let Some(link) = book.best_download_link() {
        out.push(format!("  download:   {link}"));
    }
    if let Some(cover) = book.cover_url() {
        out.push(format!("  cover:      {cover}"));
    }
    out.push(format!("  gutenberg:  {}", book.gutenberg_url()));

    out.join("\n")
}

/// `page 3 of 12 (371 books)  < 1 2 [3] 4 5 >`
pub fn pagination_line(p: &Pagination) -> String {
    let window = p
        .page_window(DEFAULT_VISIBLE_PAGES)
        .map(|n| {
            if n == p.current_page {
                format!("[{n}]")
            } else {
                n.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "page {} of {} ({} books)  {} {window} {}",
        p.current_page,
        p.total_pages,
        format_number(p.total_count),
        if p.has_previous { '<' } else { ' ' },
        if p.has_next { '>' } else { ' ' },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gutenshelf_core::Person;

    fn book() -> Book {
        Book {
            id: 1342,
            title: "Pride and Prejudice".into(),
            authors: vec![Person {
                name: "Austen, Jane".into(),
                birth_year: Some(1775),
                death_year: Some(1817),
            }],
            translators: Vec::new(),
            subjects: vec!["England -- Fiction".into()],
            bookshelves: Vec::new(),
            languages: vec!["en".into()],
            formats: [(
                "text/html".to_string(),
                "https://www.gutenberg.org/ebooks/1342.html.images".to_string(),
            )]
            .into_iter()
            .collect(),
            download_count: 48_213,
            copyright: Some(false),
            media_type: Some("Text".into()),
        }
    }

    #[test]
    fn test_book_line_marks_favorites() {
        let line = book_line(&book(), true);
        assert!(line.starts_with("*   1342  Pride and Prejudice"));
        assert!(line.contains("Austen, Jane"));
        assert!(line.ends_with("48,213"));
        assert!(book_line(&book(), false).starts_with(' '));
    }

    #[test]
    fn test_book_detail_lists_metadata() {
        let detail = book_detail(&book(), false);
        assert!(detail.contains("by Austen, Jane (1775 - 1817)"));
        assert!(detail.contains("languages:  English"));
        assert!(detail.contains("copyright:  public domain"));
        assert!(detail.contains("formats:    HTML"));
        assert!(detail.contains("gutenberg:  https://www.gutenberg.org/ebooks/1342"));
        assert!(!detail.contains("[favorite]"));
    }

    #[test]
    fn test_pagination_line() {
        let p = Pagination::from_count(371, 3, 32);
        assert_eq!(
            pagination_line(&p),
            "page 3 of 12 (371 books)  < 1 2 [3] 4 5 >"
        );

        let single = Pagination::default();
        assert_eq!(pagination_line(&single), "page 1 of 1 (0 books)    [1]  ");
    }

    #[test]
    fn test_error_envelope() {
        let v = error("not_found", "Book 9 not found");
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"], "not_found");
    }
}
