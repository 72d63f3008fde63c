use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::DEFAULT_PAGE_SIZE;

pub const DEFAULT_CATALOG_URL: &str = "https://gutendex.com/books";

/// Root application configuration, loaded from `~/.config/gutenshelf/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub browse: BrowseConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    pub search_debounce_ms: u64,
    pub popular_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: 30,
            user_agent: concat!("gutenshelf/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 500,
            popular_limit: 12,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("gutenshelf");
        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/gutenshelf/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("GUTENSHELF_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("gutenshelf")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't
    /// exist. `GUTENSHELF_DATA_DIR` overrides the data directory.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        if let Ok(dir) = std::env::var("GUTENSHELF_DATA_DIR") {
            config.set_data_dir(dir.into());
        }
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    // ─── Derived values ────────────────────────────────────

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn set_data_dir(&mut self, path: PathBuf) {
        self.storage.data_dir = path.to_string_lossy().to_string();
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.browse.search_debounce_ms)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Flattened `section.key = value` view for `config list`.
    pub fn key_values(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("catalog.base_url", self.catalog.base_url.clone()),
            ("catalog.page_size", self.catalog.page_size.to_string()),
            ("catalog.timeout_secs", self.catalog.timeout_secs.to_string()),
            ("catalog.user_agent", self.catalog.user_agent.clone()),
            (
                "browse.search_debounce_ms",
                self.browse.search_debounce_ms.to_string(),
            ),
            ("browse.popular_limit", self.browse.popular_limit.to_string()),
            ("storage.data_dir", self.storage.data_dir.clone()),
            ("server.host", self.server.host.clone()),
            ("server.port", self.server.port.to_string()),
        ])
    }
}
