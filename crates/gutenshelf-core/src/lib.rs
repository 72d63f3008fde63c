pub mod config;
pub mod debounce;
pub mod display;
pub mod error;
pub mod favorites;
pub mod models;
pub mod storage;

pub use config::{AppConfig, BrowseConfig, CatalogConfig, ServerConfig, StorageConfig};
pub use debounce::{DebounceState, Debouncer};
pub use error::{ExitCode, PersistenceError, Result, ShelfError};
pub use favorites::{FAVORITES_KEY, FavoritesStore};
pub use models::*;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
