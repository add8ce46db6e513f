//! Persistent token index backed by SQLite.
//!
//! Two relations live in one database file:
//!
//! - `files`: one metadata row per absolute path, keyed by an
//!   auto-increment `file_id` that is never reused
//! - `tokens`: a contentless FTS5 table whose `rowid` is the `file_id`,
//!   holding the space-joined token blob of that file in its `blob` column
//!
//! Every operation opens its own connection and closes it when done, so the
//! reindex daemon and query processes never share a handle. WAL journaling
//! and a busy timeout let SQLite serialize concurrent writers.

use crate::index::types::{FileId, FileInfo, FileRecord, FileResult};
use crate::utils::{AppConfig, tokens_to_blob};
use anyhow::{Context, Result};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a connection waits for a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const FILES_TABLE: &str = "files";
const TOKENS_TABLE: &str = "tokens";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS files (
        file_id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        absolute_path TEXT NOT NULL UNIQUE,
        extension TEXT
    );
    CREATE VIRTUAL TABLE IF NOT EXISTS tokens
        USING fts5(blob, content='', tokenize='porter unicode61');
";

const INSERT_FILE_SQL: &str =
    "INSERT INTO files (filename, absolute_path, extension) VALUES (?1, ?2, ?3)";

const INSERT_TOKENS_SQL: &str = "INSERT INTO tokens (rowid, blob) VALUES (?1, ?2)";

const SEARCH_SQL: &str = "
    SELECT DISTINCT f.file_id, f.filename, f.absolute_path, f.extension
    FROM tokens t
    JOIN files f ON t.rowid = f.file_id
    WHERE tokens MATCH ?1
    ORDER BY f.file_id
    LIMIT ?2 OFFSET ?3
";

/// Per-batch accounting for [`IndexStore::batch_insert`].
///
/// A record whose metadata insert fails is skipped (its tokens are not
/// written) and the rest of the batch still commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Records that got a metadata row
    pub inserted: usize,
    /// Records rejected, usually because the path is already indexed
    pub skipped: usize,
    /// Records whose metadata row was written but whose token blob failed
    pub failed_tokens: usize,
}

impl BatchOutcome {
    pub fn merge(&mut self, other: BatchOutcome) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.failed_tokens += other.failed_tokens;
    }
}

/// Handle to the index database. Holds only the path; connections are
/// opened per operation.
#[derive(Debug, Clone)]
pub struct IndexStore {
    db_path: PathBuf,
}

impl IndexStore {
    /// Open the store at `path`, creating it if missing.
    ///
    /// An existing file that lacks either relation is deleted and recreated.
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self {
            db_path: path.to_path_buf(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if store.db_path.exists() && !store.check_tables() {
            log::warn!(
                "Index store {} has an unexpected schema, recreating it",
                store.db_path.display()
            );
            store.remove_files()?;
        }

        store.init_tables()?;
        Ok(store)
    }

    /// Open the store at the configured default location
    pub fn open_default() -> Result<Self> {
        Self::open(&AppConfig::default().store_path)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open index store {}", self.db_path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        Ok(conn)
    }

    /// True when both relations exist
    fn check_tables(&self) -> bool {
        let Ok(conn) = Connection::open(&self.db_path) else {
            return false;
        };

        let count: rusqlite::Result<i64> = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2)",
            params![FILES_TABLE, TOKENS_TABLE],
            |row| row.get(0),
        );

        matches!(count, Ok(2))
    }

    fn init_tables(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)
            .with_context(|| format!("Failed to create schema in {}", self.db_path.display()))?;
        Ok(())
    }

    fn remove_files(&self) -> Result<()> {
        fs::remove_file(&self.db_path)
            .with_context(|| format!("Failed to remove {}", self.db_path.display()))?;

        for suffix in ["-wal", "-shm"] {
            let mut side = self.db_path.clone().into_os_string();
            side.push(suffix);
            let _ = fs::remove_file(PathBuf::from(side));
        }
        Ok(())
    }

    /// Insert a batch of records in one transaction.
    ///
    /// Each record gets a `files` row and, when it has tokens, a `tokens`
    /// row keyed by the new `file_id`. A path that is already indexed is
    /// rejected by the UNIQUE constraint and counted as skipped.
    pub fn batch_insert(&self, records: &[FileRecord]) -> Result<BatchOutcome> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut outcome = BatchOutcome::default();

        {
            let mut file_stmt = tx.prepare(INSERT_FILE_SQL)?;
            let mut token_stmt = tx.prepare(INSERT_TOKENS_SQL)?;

            for record in records {
                let inserted = file_stmt.execute(params![
                    record.filename,
                    record.absolute_path,
                    record.extension
                ]);

                if let Err(e) = inserted {
                    if !is_constraint_violation(&e) {
                        log::warn!("Failed to index {}: {}", record.absolute_path, e);
                    }
                    outcome.skipped += 1;
                    continue;
                }

                outcome.inserted += 1;
                let file_id = tx.last_insert_rowid();

                if record.tokens.is_empty() {
                    continue;
                }

                let blob = tokens_to_blob(&record.tokens);
                if let Err(e) = token_stmt.execute(params![file_id, blob]) {
                    log::warn!("Failed to index tokens for {}: {}", record.absolute_path, e);
                    outcome.failed_tokens += 1;
                }
            }
        }

        tx.commit().context("Failed to commit index batch")?;
        Ok(outcome)
    }

    /// Insert a single file without tokens. Returns its id, or `None` if the
    /// path is already indexed or the store is unavailable.
    pub fn insert_file(&self, filename: &str, absolute_path: &str, extension: &str) -> Option<FileId> {
        let result = self.connect().and_then(|conn| {
            conn.execute(INSERT_FILE_SQL, params![filename, absolute_path, extension])?;
            Ok(conn.last_insert_rowid())
        });

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                log::debug!("insert_file {} failed: {}", absolute_path, e);
                None
            }
        }
    }

    /// Identifier of an indexed path
    pub fn file_id(&self, absolute_path: &str) -> Option<FileId> {
        let conn = self.connect().ok()?;
        conn.query_row(
            "SELECT file_id FROM files WHERE absolute_path = ?1 LIMIT 1",
            params![absolute_path],
            |row| row.get(0),
        )
        .optional()
        .ok()
        .flatten()
    }

    pub fn contains(&self, absolute_path: &str) -> bool {
        self.file_id(absolute_path).is_some()
    }

    /// Number of metadata rows
    pub fn file_count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// First `limit` metadata rows in id order, for inspection
    pub fn list_files(&self, limit: usize) -> Result<Vec<(FileId, FileInfo)>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT file_id, filename, absolute_path, extension FROM files ORDER BY file_id LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, FileId>(0)?,
                    FileInfo {
                        filename: row.get(1)?,
                        absolute_path: row.get(2)?,
                        extension: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Files with any token starting with `prefix`, paginated.
    ///
    /// Returns an empty list when nothing matches or the store cannot be read.
    pub fn search(&self, prefix: &str, limit: usize, offset: usize) -> Vec<FileResult> {
        match self.try_search(prefix, limit, offset) {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Index search for {:?} failed: {:#}", prefix, e);
                Vec::new()
            }
        }
    }

    /// Like [`search`](Self::search) but reports store failures
    pub fn try_search(&self, prefix: &str, limit: usize, offset: usize) -> Result<Vec<FileResult>> {
        let Some(query) = prefix_query(prefix) else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.connect()?;
        let mut stmt = conn.prepare(SEARCH_SQL)?;
        let results = stmt
            .query_map(params![query, limit as i64, offset as i64], |row| {
                Ok(FileInfo {
                    filename: row.get(1)?,
                    absolute_path: row.get(2)?,
                    extension: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(results)
    }
}

/// Build an FTS5 trailing-wildcard query. The prefix is quoted so FTS5
/// operators and punctuation in user input are taken literally.
fn prefix_query(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("\"{}\"*", trimmed.replace('"', "\"\"")))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}
