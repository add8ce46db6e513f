//! Query façade used by front ends.
//!
//! Prefix lookups go to the in-memory trie loaded from the daemon's
//! snapshot; token lookups go to the index store. The two never share
//! state, so a trie loaded earlier can lag behind the store until
//! [`Searcher::reload`] is called.

use crate::index::store::IndexStore;
use crate::index::trie::Trie;
use crate::index::types::FileInfo;
use crate::utils::AppConfig;
use anyhow::Result;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// Results returned by a trie lookup when no count is given
pub const DEFAULT_TRIE_RESULTS: usize = 10;

/// Fixed page size of index lookups
pub const INDEX_PAGE_SIZE: usize = 10;

pub struct Searcher {
    trie: Trie,
    store: IndexStore,
    snapshot_path: PathBuf,
}

impl Searcher {
    /// Create a searcher, loading the trie snapshot if one exists
    pub fn new(store: IndexStore, snapshot_path: impl Into<PathBuf>) -> Self {
        let mut searcher = Self {
            trie: Trie::new(),
            store,
            snapshot_path: snapshot_path.into(),
        };
        if let Err(e) = searcher.reload() {
            log::warn!("{:#}", e);
        }
        searcher
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = IndexStore::open(&config.store_path)?;
        Ok(Self::new(store, &config.snapshot_path))
    }

    /// Build a searcher around an existing trie without touching disk
    pub fn with_trie(trie: Trie, store: IndexStore, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            trie,
            store,
            snapshot_path: snapshot_path.into(),
        }
    }

    /// Re-read the trie snapshot. Returns false if there was none to read.
    pub fn reload(&mut self) -> Result<bool> {
        self.trie.load(&self.snapshot_path)
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Up to `n` files whose name starts with `prefix`, nearest names first
    pub fn trie_search(&self, prefix: &str, n: usize) -> Vec<FileInfo> {
        self.trie.search_prefix_n(prefix, n)
    }

    /// One page of files with a path token starting with `prefix`
    pub fn index_search(&self, prefix: &str, offset: usize) -> Vec<FileInfo> {
        self.store.search(prefix, INDEX_PAGE_SIZE, offset)
    }

    /// Trie results followed by the first index page, deduplicated by path
    pub fn search(&self, prefix: &str) -> Vec<FileInfo> {
        merge_results(
            self.trie_search(prefix, DEFAULT_TRIE_RESULTS),
            self.index_search(prefix, 0),
        )
    }
}

/// Concatenate trie and index results, dropping any path already seen
pub fn merge_results(trie: Vec<FileInfo>, index: Vec<FileInfo>) -> Vec<FileInfo> {
    let mut seen = FxHashSet::default();
    trie.into_iter()
        .chain(index)
        .filter(|info| seen.insert(info.absolute_path.clone()))
        .collect()
}
