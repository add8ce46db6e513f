pub mod crawler;
pub mod snapshot;
pub mod store;
pub mod trie;
pub mod types;

pub use crawler::{CrawlStats, Crawler, IgnoreSet};
pub use store::{BatchOutcome, IndexStore};
pub use trie::Trie;
pub use types::*;

use crate::utils::AppConfig;
use crate::utils::progress::spinner;
use anyhow::Result;
use std::path::Path;

/// Crawl `root` once into the configured store and snapshot.
/// Used by the CLI for a manual reindex.
pub fn build_index(config: &AppConfig, root: &Path, silent: bool) -> Result<CrawlStats> {
    if !silent {
        println!("Indexing: {}", root.display());
    }

    let crawler = Crawler::new(root, IndexStore::open(&config.store_path)?, config_ignore(config))
        .with_batch_size(config.effective_batch_size());

    let progress = spinner("Crawling files...", silent);
    let mut trie = Trie::new();
    let stats = crawler.crawl(&mut trie)?;
    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Found {} files ({} new in index)",
            stats.files, stats.index.inserted
        ));
    }

    trie.save(&config.snapshot_path)?;

    if !silent {
        println!("Index stored at: {}", config.store_path.display());
        println!("Trie snapshot at: {}", config.snapshot_path.display());
        if stats.errors > 0 {
            eprintln!("({} entries could not be read)", stats.errors);
        }
    }

    Ok(stats)
}

fn config_ignore(config: &AppConfig) -> IgnoreSet {
    IgnoreSet::new(config.ignored_dirs.iter().cloned())
}
