mod output;
mod repl;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gutenshelf_catalog::{BrowseController, CatalogError, CatalogSource, GutendexClient, Phase};
use gutenshelf_core::{
    AppConfig, ExitCode, FavoritesStore, JsonFileStore, LANGUAGES, POPULAR_SUBJECTS,
    SearchParameters, SortOrder,
};

use crate::output::{book_detail, book_line, pagination_line, print_json};
use crate::repl::Repl;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "gutenshelf",
    about = "Browse and bookmark Project Gutenberg books from the terminal",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting GUTENSHELF_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog. With no query, lists popular books.
    Search {
        query: Option<String>,
        #[arg(long, default_value = "1")]
        page: u32,
        /// Language codes, comma separated (e.g. en,fr).
        #[arg(long = "lang", value_delimiter = ',')]
        languages: Vec<String>,
        #[arg(long)]
        topic: Option<String>,
        /// popular, title, newest or downloads.
        #[arg(long, default_value = "popular")]
        sort: SortOrder,
        /// true for copyrighted books only, false for public domain only.
        #[arg(long)]
        copyright: Option<bool>,
    },

    /// Show one book.
    Book { id: u32 },

    /// Most downloaded books.
    Popular {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage favorite books.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Interactive browser (default when no command is given).
    Browse { query: Option<String> },

    /// Run the local catalog proxy.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List language codes and suggested subjects.
    Filters,

    /// Print version.
    Version,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorite ids.
    List,
    /// Fetch and show every favorite book.
    Show,
    Add { id: u32 },
    Remove { id: u32 },
    Toggle { id: u32 },
    /// Remove all favorites.
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key, e.g. `catalog.base_url`.
    Get { key: String },
    /// Print the config file path.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    let json_output = cli.json || std::env::var("GUTENSHELF_JSON").as_deref() == Ok("1");
    let default_filter = match cli.command {
        Some(Commands::Serve { .. }) => "info",
        _ => "warn",
    };
    init_tracing(default_filter);

    let config = AppConfig::load().context("failed to load config")?;

    match cli.command {
        None => browse(&config, None).await?,
        Some(Commands::Browse { query }) => browse(&config, query).await?,

        Some(Commands::Search {
            query,
            page,
            languages,
            topic,
            sort,
            copyright,
        }) => {
            let params = SearchParameters {
                search: query.unwrap_or_default(),
                page: page.max(1),
                languages,
                topic,
                sort,
                copyright,
            };
            let source = catalog(&config)?;
            let controller = BrowseController::with_debounce(
                source,
                params.clone(),
                config.search_debounce(),
            );

            if controller.wait_settled().await == Phase::Failed {
                if let Some(err) = controller.state().error() {
                    catalog_failure(json_output, err)?;
                }
            }

            let state = controller.state();
            let pagination = *state.pagination();
            if json_output {
                print_json(&output::ok(
                    json!({
                        "items": state.books(),
                        "total": pagination.total_count,
                        "page": pagination.current_page,
                        "total_pages": pagination.total_pages,
                        "query": params,
                    }),
                    start,
                ))?;
            } else if state.books().is_empty() {
                println!("No books found.");
            } else {
                let favorites = open_favorites(&config);
                for book in state.books() {
                    println!("{}", book_line(book, favorites.contains(book.id)));
                }
                println!("{}", pagination_line(&pagination));
            }
        }

        Some(Commands::Book { id }) => {
            let source = catalog(&config)?;
            match source.get_by_id(id).await {
                Ok(book) => {
                    if json_output {
                        print_json(&output::ok(json!(book), start))?;
                    } else {
                        let favorites = open_favorites(&config);
                        println!("{}", book_detail(&book, favorites.contains(id)));
                    }
                }
                Err(e) => catalog_failure(json_output, &e)?,
            }
        }

        Some(Commands::Popular { limit }) => {
            let limit = limit.unwrap_or(config.browse.popular_limit);
            let source = catalog(&config)?;
            match source.popular(limit).await {
                Ok(books) => {
                    if json_output {
                        print_json(&output::ok(
                            json!({ "items": books, "total": books.len() }),
                            start,
                        ))?;
                    } else {
                        let favorites = open_favorites(&config);
                        for book in &books {
                            println!("{}", book_line(book, favorites.contains(book.id)));
                        }
                    }
                }
                Err(e) => catalog_failure(json_output, &e)?,
            }
        }

        Some(Commands::Favorites { action }) => {
            favorites_command(&config, action, json_output, start).await?
        }

        Some(Commands::Serve { host, port }) => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if !json_output {
                println!(
                    "Serving {} at http://{}{}",
                    config.catalog.base_url,
                    config.server_addr(),
                    gutenshelf_server::BOOKS_ROUTE
                );
            }
            gutenshelf_server::serve(&config).await?;
        }

        Some(Commands::Config { action }) => match action {
            ConfigAction::List => {
                let kv = config.key_values();
                if json_output {
                    print_json(&output::ok(json!(kv), start))?;
                } else {
                    for (k, v) in &kv {
                        println!("{k} = {v}");
                    }
                }
            }
            ConfigAction::Get { key } => match config.key_values().get(key.as_str()) {
                Some(value) => {
                    if json_output {
                        print_json(&output::ok(json!({ "key": key, "value": value }), start))?;
                    } else {
                        println!("{value}");
                    }
                }
                None => fail(
                    json_output,
                    "invalid_args",
                    &format!("Unknown config key: {key}"),
                    ExitCode::InvalidArgs,
                )?,
            },
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if json_output {
                    print_json(&output::ok(json!({ "path": path }), start))?;
                } else {
                    println!("{}", path.display());
                }
            }
        },

        Some(Commands::Filters) => {
            if json_output {
                print_json(&output::ok(
                    json!({ "languages": LANGUAGES, "subjects": POPULAR_SUBJECTS }),
                    start,
                ))?;
            } else {
                println!("Languages:");
                for lang in &LANGUAGES {
                    println!("  {:<4}{}", lang.code, lang.name);
                }
                println!("Subjects:");
                for subject in POPULAR_SUBJECTS {
                    println!("  {subject}");
                }
            }
        }

        Some(Commands::Version) => {
            if json_output {
                print_json(&json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                }))?;
            } else {
                println!("gutenshelf {}", env!("CARGO_PKG_VERSION"));
            }
        }
    }

    Ok(())
}

// ─── Commands ───────────────────────────────────────────────────────────────

async fn browse(config: &AppConfig, query: Option<String>) -> Result<()> {
    let source = catalog(config)?;
    let params = SearchParameters::with_search(query.unwrap_or_default());
    let controller =
        BrowseController::with_debounce(Arc::clone(&source), params, config.search_debounce());
    Repl::new(controller, source, open_favorites(config))
        .run()
        .await
}

async fn favorites_command(
    config: &AppConfig,
    action: FavoritesAction,
    json_output: bool,
    start: Instant,
) -> Result<()> {
    let mut favorites = open_favorites(config);

    let (id, changed, now_favorite) = match action {
        FavoritesAction::List => {
            if json_output {
                print_json(&output::ok(json!({ "ids": favorites.list() }), start))?;
            } else if favorites.is_empty() {
                println!("No favorites yet. Use `gutenshelf favorites add <id>`.");
            } else {
                for id in favorites.list() {
                    println!("{id}");
                }
            }
            return Ok(());
        }
        FavoritesAction::Show => {
            let source = catalog(config)?;
            match source.get_many(favorites.list()).await {
                Ok(books) => {
                    if json_output {
                        print_json(&output::ok(json!({ "items": books }), start))?;
                    } else if books.is_empty() {
                        println!("No favorites yet.");
                    } else {
                        for book in &books {
                            println!("{}", book_line(book, true));
                        }
                    }
                }
                Err(e) => catalog_failure(json_output, &e)?,
            }
            return Ok(());
        }
        FavoritesAction::Clear => {
            let count = favorites.len();
            favorites.clear();
            warn_unsaved(&mut favorites);
            if json_output {
                print_json(&output::ok(json!({ "removed": count }), start))?;
            } else {
                println!("Removed {count} favorites.");
            }
            return Ok(());
        }
        FavoritesAction::Add { id } => (id, favorites.add(id), true),
        FavoritesAction::Remove { id } => (id, favorites.remove(id), false),
        FavoritesAction::Toggle { id } => {
            let now = favorites.toggle(id);
            (id, true, now)
        }
    };
    warn_unsaved(&mut favorites);

    if json_output {
        print_json(&output::ok(
            json!({ "id": id, "favorite": now_favorite, "changed": changed }),
            start,
        ))?;
    } else {
        let verb = match (changed, now_favorite) {
            (true, true) => "Added",
            (true, false) => "Removed",
            (false, true) => "Already a favorite:",
            (false, false) => "Not a favorite:",
        };
        println!("{verb} {id}");
    }
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn catalog(config: &AppConfig) -> Result<Arc<dyn CatalogSource>> {
    tracing::debug!(base_url = %config.catalog.base_url, "using catalog");
    let client = GutendexClient::new(&config.catalog).context("invalid catalog settings")?;
    Ok(Arc::new(client))
}

fn open_favorites(config: &AppConfig) -> FavoritesStore {
    FavoritesStore::open(JsonFileStore::new(config.data_dir()))
}

fn warn_unsaved(favorites: &mut FavoritesStore) {
    if let Some(e) = favorites.take_persistence_error() {
        eprintln!("warning: favorites were not saved: {e}");
    }
}

/// Report a catalog error and exit with its code.
fn catalog_failure(json_output: bool, err: &CatalogError) -> Result<()> {
    let (kind, code) = failure_kind(err);
    let message = match err {
        CatalogError::NotFound { id } => format!("Book {id} not found"),
        _ => err.to_string(),
    };
    fail(json_output, kind, &message, code)
}

/// Error kind for the JSON envelope and the exit code: 2 when the
/// catalog has no such book or page, 6 when the catalog could not be
/// reached or answered badly.
fn failure_kind(err: &CatalogError) -> (&'static str, ExitCode) {
    match err {
        CatalogError::NotFound { .. } | CatalogError::Upstream { status: 404, .. } => {
            ("not_found", ExitCode::NotFound)
        }
        CatalogError::Upstream { .. } | CatalogError::Decode { .. } => {
            ("upstream", ExitCode::NetworkError)
        }
        CatalogError::Transport { .. } => ("network", ExitCode::NetworkError),
        CatalogError::InvalidUrl(_) | CatalogError::ClientBuild(_) => {
            ("config", ExitCode::GeneralError)
        }
    }
}

fn fail(json_output: bool, kind: &str, message: &str, code: ExitCode) -> Result<()> {
    if json_output {
        print_json(&output::error(kind, message))?;
    } else {
        eprintln!("{message}");
    }
    std::process::exit(code as i32);
}
