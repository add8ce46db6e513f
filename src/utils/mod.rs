//! Utility functions shared across the crate.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration and app data directory management (XDG-compliant)
//! - [`encoding`] - Raw binary helpers used by the trie snapshot format
//! - [`progress`] - Spinners for the CLI (no-op without the `progress` feature)
//! - [`tokenizer`] - Path tokenization (separators, camelCase)
//!
//! ```no_run
//! use spotlight::utils::tokenize;
//!
//! let tokens = tokenize("MyFile.txt");
//! // Returns: {"my", "file", "txt"}
//! ```

pub mod app_data;
pub mod encoding;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use tokenizer::*;
