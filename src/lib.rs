//! # Spotlight - Local File Search
//!
//! Spotlight keeps two indexes over the file names under a root directory
//! and answers prefix queries against both:
//!
//! - a byte-keyed prefix trie of file names, snapshotted to disk, and
//! - an SQLite FTS5 table of path tokens (`Documents/MyFile.txt` becomes
//!   `documents my file txt`).
//!
//! ## Architecture
//!
//! - [`index`] - Trie, snapshot format, token store and the crawler that fills both
//! - [`query`] - Search façade over the trie and the store
//! - [`server`] - Background reindex daemon
//! - [`output`] - Result formatting for the CLI
//! - [`utils`] - Tokenizer, binary helpers, configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use spotlight::query::Searcher;
//! use spotlight::utils::AppConfig;
//!
//! let config = AppConfig::load().unwrap();
//! let searcher = Searcher::from_config(&config).unwrap();
//!
//! for file in searcher.search("report") {
//!     println!("{}", file.absolute_path);
//! }
//! ```

pub mod index;
pub mod output;
pub mod query;
pub mod server;
pub mod utils;
