use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "spotlight";
const CONFIG_FILE: &str = "config.json";
const STORE_FILE: &str = "crawl.db";
const SNAPSHOT_FILE: &str = "trie.dat";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory the crawler walks
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// SQLite file holding the token index
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Binary trie snapshot written by the daemon and read by queries
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Directory basenames never descended into (dot-directories are always skipped)
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    /// Seconds between reindex cycles
    #[serde(default = "default_reindex_interval_secs")]
    pub reindex_interval_secs: u64,

    /// Records buffered before each index store flush
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_root() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/home"))
}

fn default_store_path() -> PathBuf {
    data_dir_or_tmp().join(STORE_FILE)
}

fn default_snapshot_path() -> PathBuf {
    data_dir_or_tmp().join(SNAPSHOT_FILE)
}

pub fn default_ignored_dirs() -> Vec<String> {
    ["node_modules", "build", ".git", "R"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_reindex_interval_secs() -> u64 {
    300
}

fn default_batch_size() -> usize {
    1000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            store_path: default_store_path(),
            snapshot_path: default_snapshot_path(),
            ignored_dirs: default_ignored_dirs(),
            reindex_interval_secs: default_reindex_interval_secs(),
            batch_size: default_batch_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from an explicit file, falling back to defaults if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    /// Save config to an explicit file, creating its directory if needed
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Interval between reindex cycles, never shorter than one second
    pub fn reindex_interval(&self) -> Duration {
        Duration::from_secs(self.reindex_interval_secs.max(1))
    }

    /// Batch size with 0 resolved to the default
    pub fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 {
            default_batch_size()
        } else {
            self.batch_size
        }
    }
}

/// Get the path to the config file. The file and its directory may not exist yet.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join(CONFIG_FILE))
}

/// Resolve the application data directory without creating it.
/// Writers create it on demand.
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    Ok(base.join(APP_NAME))
}

fn data_dir_or_tmp() -> PathBuf {
    get_app_data_dir().unwrap_or_else(|_| std::env::temp_dir().join(APP_NAME))
}
