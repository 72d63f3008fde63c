use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use gutenshelf_catalog::{BrowseController, BrowseState, CatalogSource, Phase};
use gutenshelf_core::{FavoritesStore, ParamsUpdate, SortOrder};

use crate::output::{book_detail, book_line, pagination_line};

const HELP: &str = "\
commands:
  n, next              next page
  p, prev              previous page
  page <n>             jump to page n
  s, search <text>     search now (empty text clears)
  type <text>          search once typing pauses
  lang <codes>         language filter, e.g. `lang en,fr` (empty clears)
  topic <text>         topic filter (empty clears)
  subject <a,b>        narrow this page by subject (empty clears)
  sort <order>         popular | title | newest | downloads
  copyright <y|n|any>  copyright filter
  fav <id>             toggle a favorite
  favs                 list favorites
  show <id>            book details
  r, retry             fetch again
  h, help              this text
  q, quit              leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Next,
    Previous,
    Page(u32),
    Search(String),
    Type(String),
    Languages(Vec<String>),
    Topic(Option<String>),
    Subjects(Vec<String>),
    Sort(SortOrder),
    Copyright(Option<bool>),
    ToggleFavorite(u32),
    Favorites,
    Show(u32),
    Retry,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    let command = match cmd.to_lowercase().as_str() {
        "n" | "next" => ReplCommand::Next,
        "p" | "prev" | "previous" => ReplCommand::Previous,
        "page" => ReplCommand::Page(parse_number(rest, "page <n>")?),
        "s" | "search" => ReplCommand::Search(rest.to_string()),
        "type" => ReplCommand::Type(rest.to_string()),
        "lang" | "languages" => ReplCommand::Languages(split_list(rest, &[',', ' '])),
        "topic" => ReplCommand::Topic((!rest.is_empty()).then(|| rest.to_string())),
        "subject" | "subjects" => ReplCommand::Subjects(split_list(rest, &[','])),
        "sort" => ReplCommand::Sort(rest.parse::<SortOrder>().map_err(|_| {
            let names: Vec<_> = SortOrder::ALL.iter().map(|o| o.as_str()).collect();
            format!("unknown sort `{rest}`, expected one of: {}", names.join(", "))
        })?),
        "copyright" => ReplCommand::Copyright(match rest.to_lowercase().as_str() {
            "y" | "yes" | "true" => Some(true),
            "n" | "no" | "false" => Some(false),
            "" | "any" => None,
            other => return Err(format!("unknown copyright filter `{other}`, use y, n or any")),
        }),
        "fav" => ReplCommand::ToggleFavorite(parse_number(rest, "fav <id>")?),
        "favs" | "favorites" => ReplCommand::Favorites,
        "show" | "book" => ReplCommand::Show(parse_number(rest, "show <id>")?),
        "r" | "retry" | "reload" => ReplCommand::Retry,
        "h" | "help" | "?" => ReplCommand::Help,
        "q" | "quit" | "exit" => ReplCommand::Quit,
        other => return Err(format!("unknown command `{other}`, type `help`")),
    };
    Ok(Some(command))
}

fn parse_number(text: &str, usage: &str) -> Result<u32, String> {
    text.parse().map_err(|_| format!("usage: {usage}"))
}

fn split_list(text: &str, separators: &[char]) -> Vec<String> {
    text.split(separators)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// What was last drawn, so a state change that doesn't affect the
/// screen is skipped.
#[derive(Debug, PartialEq)]
struct Drawn {
    version: u64,
    phase: Phase,
    subject_filter: Vec<String>,
}

impl Drawn {
    fn of(state: &BrowseState) -> Self {
        Self {
            version: state.latest_version(),
            phase: state.phase(),
            subject_filter: state.subject_filter().to_vec(),
        }
    }
}

pub struct Repl {
    controller: BrowseController,
    source: Arc<dyn CatalogSource>,
    favorites: FavoritesStore,
    drawn: Option<Drawn>,
}

impl Repl {
    pub fn new(
        controller: BrowseController,
        source: Arc<dyn CatalogSource>,
        favorites: FavoritesStore,
    ) -> Self {
        Self {
            controller,
            source,
            favorites,
            drawn: None,
        }
    }

    /// Read commands from stdin until `quit` or EOF, redrawing whenever the
    /// browse state settles on something new.
    pub async fn run(mut self) -> Result<()> {
        let mut rx = self.controller.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("type `help` for commands");
        self.redraw(&rx.borrow_and_update());

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match parse(&line) {
                        Ok(Some(ReplCommand::Quit)) => break,
                        Ok(Some(command)) => self.execute(command).await,
                        Ok(None) => {}
                        Err(msg) => eprintln!("{msg}"),
                    }
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.redraw(&rx.borrow_and_update());
                }
            }
        }
        Ok(())
    }

    async fn execute(&mut self, command: ReplCommand) {
        let ctrl = &self.controller;
        match command {
            ReplCommand::Next => {
                if !ctrl.next_page() {
                    println!("already on the last page");
                }
            }
            ReplCommand::Previous => {
                if !ctrl.previous_page() {
                    println!("already on the first page");
                }
            }
            ReplCommand::Page(n) => {
                if !ctrl.go_to_page(n) {
                    let total = ctrl.state().pagination().total_pages;
                    println!("page {n} is out of range (1-{total})");
                }
            }
            ReplCommand::Search(text) => ctrl.submit_search(text),
            ReplCommand::Type(text) => ctrl.type_search(text),
            ReplCommand::Languages(codes) => ctrl.update_parameters(ParamsUpdate::languages(codes)),
            ReplCommand::Topic(topic) => ctrl.update_parameters(ParamsUpdate::topic(topic)),
            ReplCommand::Subjects(subjects) => ctrl.set_subject_filter(subjects),
            ReplCommand::Sort(order) => ctrl.update_parameters(ParamsUpdate::sort(order)),
            ReplCommand::Copyright(c) => ctrl.update_parameters(ParamsUpdate::copyright(c)),
            ReplCommand::ToggleFavorite(id) => {
                if self.favorites.toggle(id) {
                    println!("added {id} to favorites");
                } else {
                    println!("removed {id} from favorites");
                }
                if let Some(e) = self.favorites.take_persistence_error() {
                    eprintln!("warning: favorites were not saved: {e}");
                }
            }
            ReplCommand::Favorites => {
                if self.favorites.is_empty() {
                    println!("no favorites yet");
                } else {
                    let ids: Vec<_> = self.favorites.list().iter().map(u32::to_string).collect();
                    println!("favorites: {}", ids.join(", "));
                }
            }
            ReplCommand::Show(id) => match self.source.get_by_id(id).await {
                Ok(book) => println!("{}", book_detail(&book, self.favorites.contains(id))),
                Err(e) => eprintln!("{e}"),
            },
            ReplCommand::Retry => ctrl.reload(),
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => {}
        }
    }

    fn redraw(&mut self, state: &BrowseState) {
        let drawn = Drawn::of(state);
        if self.drawn.as_ref() == Some(&drawn) {
            return;
        }

        match state.phase() {
            Phase::Idle => return,
            Phase::Loading => println!("loading..."),
            Phase::Failed => {
                let message = state
                    .error()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown error".to_string());
                println!("error: {message}");
                println!("type `retry` to try again");
            }
            Phase::Ready => {
                let books = state.visible_books();
                if books.is_empty() {
                    println!("no books found");
                }
                for book in books {
                    println!("{}", book_line(book, self.favorites.contains(book.id)));
                }
                println!("{}", pagination_line(state.pagination()));
                if !state.subject_filter().is_empty() {
                    println!("subjects: {}", state.subject_filter().join(", "));
                }
            }
        }
        self.drawn = Some(drawn);
    }
}
