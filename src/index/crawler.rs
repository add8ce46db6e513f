//! Filesystem crawler feeding the trie and the index store.

use crate::index::store::{BatchOutcome, IndexStore};
use crate::index::trie::Trie;
use crate::index::types::FileRecord;
use crate::utils::{AppConfig, default_ignored_dirs};
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Records buffered before each flush to the index store
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Directory basenames the crawler never descends into.
/// Names starting with `.` are always ignored as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    names: FxHashSet<String>,
}

impl IgnoreSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Only the dot-directory rule
    pub fn empty() -> Self {
        Self::new(std::iter::empty::<String>())
    }

    pub fn is_ignored(&self, dir_name: &str) -> bool {
        dir_name.starts_with('.') || self.names.contains(dir_name)
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::new(default_ignored_dirs())
    }
}

/// Counters for one crawl pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Regular files turned into records
    pub files: usize,
    /// Directories skipped by the ignore rules
    pub dirs_skipped: usize,
    /// Entries that could not be read
    pub errors: usize,
    /// Batches the index store could not take
    pub failed_batches: usize,
    /// Index store accounting across all batches
    pub index: BatchOutcome,
}

/// Walks a directory tree, inserting every regular file into a trie and
/// the index store.
#[derive(Debug, Clone)]
pub struct Crawler {
    root: PathBuf,
    store: IndexStore,
    ignore: IgnoreSet,
    batch_size: usize,
}

impl Crawler {
    pub fn new(root: impl Into<PathBuf>, store: IndexStore, ignore: IgnoreSet) -> Self {
        Self {
            root: root.into(),
            store,
            ignore,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Build a crawler from configuration, opening (or creating) the store
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = IndexStore::open(&config.store_path)?;
        let ignore = IgnoreSet::new(config.ignored_dirs.iter().cloned());
        Ok(Self::new(&config.root, store, ignore).with_batch_size(config.effective_batch_size()))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// True when running with an effective uid of 0
    pub fn has_privilege() -> bool {
        #[cfg(unix)]
        {
            unsafe { libc::geteuid() == 0 }
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Crawl the root once.
    ///
    /// Unreadable entries are logged and skipped. Only an unusable root
    /// directory fails the crawl.
    pub fn crawl(&self, trie: &mut Trie) -> Result<CrawlStats> {
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("Invalid crawl root {}", self.root.display()))?;
        if !root.is_dir() {
            anyhow::bail!("Crawl root {} is not a directory", root.display());
        }

        let dirs_skipped = Arc::new(AtomicUsize::new(0));
        let skipped_clone = Arc::clone(&dirs_skipped);
        let ignore = self.ignore.clone();

        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                if is_dir && ignore.is_ignored(&entry.file_name().to_string_lossy()) {
                    skipped_clone.fetch_add(1, Ordering::Relaxed);
                    return false;
                }
                true
            })
            .build();

        let mut stats = CrawlStats::default();
        let mut pending: Vec<PathBuf> = Vec::with_capacity(self.batch_size);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    stats.errors += 1;
                    if is_permission_denied(&e) {
                        log::debug!("Skipping unreadable entry: {}", e);
                    } else {
                        log::warn!("Error accessing entry: {}", e);
                    }
                    continue;
                }
            };

            if !entry.path().is_file() {
                continue;
            }

            pending.push(entry.into_path());
            if pending.len() >= self.batch_size {
                self.flush(&mut pending, trie, &mut stats);
            }
        }

        if !pending.is_empty() {
            self.flush(&mut pending, trie, &mut stats);
        }

        stats.dirs_skipped = dirs_skipped.load(Ordering::Relaxed);
        Ok(stats)
    }

    fn flush(&self, pending: &mut Vec<PathBuf>, trie: &mut Trie, stats: &mut CrawlStats) {
        // Tokenizing is the costly part; order is preserved so later
        // duplicates of a filename still win in the trie
        let records: Vec<FileRecord> = pending
            .par_iter()
            .map(|path| FileRecord::from_path(path))
            .collect();
        pending.clear();

        for record in &records {
            trie.insert(&record.filename, &record.absolute_path, &record.extension);
        }
        stats.files += records.len();

        match self.store.batch_insert(&records) {
            Ok(outcome) => {
                log::debug!(
                    "Flushed {} records ({} new, {} already indexed)",
                    records.len(),
                    outcome.inserted,
                    outcome.skipped
                );
                stats.index.merge(outcome);
            }
            Err(e) => {
                stats.failed_batches += 1;
                log::error!("Failed to write batch of {} records: {:#}", records.len(), e);
            }
        }
    }
}

fn is_permission_denied(err: &ignore::Error) -> bool {
    err.io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied)
}
