//! Reindex loop and daemon process management.

use crate::index::crawler::{CrawlStats, Crawler};
use crate::index::trie::Trie;
use crate::server::{get_error_log_path, get_pid_path, parse_pid};
use crate::utils::AppConfig;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pause between reindex cycles
pub const DEFAULT_REINDEX_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Drives the crawler on a fixed schedule
pub struct Reindexer {
    crawler: Crawler,
    snapshot_path: PathBuf,
    interval: Duration,
}

impl Reindexer {
    pub fn new(crawler: Crawler, snapshot_path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            crawler,
            snapshot_path: snapshot_path.into(),
            interval,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let crawler = Crawler::from_config(config)?;
        Ok(Self::new(
            crawler,
            &config.snapshot_path,
            config.reindex_interval(),
        ))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// One full crawl into a fresh trie, then replace the snapshot
    pub fn run_cycle(&self) -> Result<CrawlStats> {
        log::info!("beginning index at {}", timestamp());
        let start = Instant::now();

        let mut trie = Trie::new();
        let stats = self.crawler.crawl(&mut trie)?;
        trie.save(&self.snapshot_path)?;

        log::info!(
            "created index at {} ({} files, {} new, {} errors, {:.1}s)",
            timestamp(),
            stats.files,
            stats.index.inserted,
            stats.errors,
            start.elapsed().as_secs_f64()
        );
        Ok(stats)
    }

    /// Reindex forever. A failed cycle is logged and retried after the interval.
    pub fn run_forever(&self) -> ! {
        if !Crawler::has_privilege() {
            log::warn!("Not running as root; protected directories will be skipped");
        }

        loop {
            self.run_cycle_logged();
            thread::sleep(self.interval);
        }
    }

    fn run_cycle_logged(&self) -> bool {
        match self.run_cycle() {
            Ok(_) => true,
            Err(e) => {
                log::error!("Reindex cycle failed: {:#}", e);
                false
            }
        }
    }

    /// Run [`run_forever`](Self::run_forever) on a dedicated background thread
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("reindex".to_string())
            .spawn(move || self.run_forever())
    }
}

/// Run the reindex loop in the current process
pub fn run_foreground(config: &AppConfig) -> Result<()> {
    let reindexer = Reindexer::from_config(config)?;
    write_pid_file()?;
    reindexer.run_forever()
}

fn write_pid_file() -> Result<()> {
    let pid_path = get_pid_path();
    if let Some(parent) = pid_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&pid_path, format!("{}", std::process::id()))
        .with_context(|| format!("Failed to write {}", pid_path.display()))?;
    Ok(())
}

/// Detach from the terminal and run the reindex loop in the background
#[cfg(unix)]
pub fn daemonize(config: &AppConfig) -> Result<()> {
    match unsafe { libc::fork() } {
        -1 => anyhow::bail!("First fork failed"),
        0 => {
            if unsafe { libc::setsid() } == -1 {
                anyhow::bail!("setsid failed");
            }

            // The session leader exits so the daemon can never regain a terminal
            match unsafe { libc::fork() } {
                -1 => anyhow::bail!("Second fork failed"),
                0 => {
                    redirect_stdio_to_null();
                    let _ = std::env::set_current_dir("/");

                    if let Err(e) = run_foreground(config) {
                        let _ = fs::write(get_error_log_path(), format!("{:#}", e));
                    }
                    std::process::exit(1);
                }
                _ => std::process::exit(0),
            }
        }
        _ => {
            let mut status: libc::c_int = 0;
            unsafe {
                libc::wait(&mut status);
            }
            Ok(())
        }
    }
}

#[cfg(unix)]
fn redirect_stdio_to_null() {
    unsafe {
        let null = libc::open(c"/dev/null".as_ptr(), libc::O_RDWR);
        if null == -1 {
            return;
        }
        for fd in 0..=2 {
            libc::dup2(null, fd);
        }
        if null > 2 {
            libc::close(null);
        }
    }
}

#[cfg(not(unix))]
pub fn daemonize(_config: &AppConfig) -> Result<()> {
    anyhow::bail!("Background mode is only supported on Unix; use `daemon foreground`")
}

/// Stop the running daemon. Returns false if no PID file was found.
#[cfg(unix)]
pub fn stop_daemon() -> Result<bool> {
    let pid_path = get_pid_path();
    if !pid_path.exists() {
        return Ok(false);
    }

    let contents = fs::read_to_string(&pid_path)?;
    let Some(pid) = parse_pid(&contents) else {
        let _ = fs::remove_file(&pid_path);
        anyhow::bail!("Invalid PID file {}: {:?}", pid_path.display(), contents.trim());
    };

    if signal(pid, libc::SIGTERM) {
        // SIGKILL only if the reindexer is still alive after ~1.5s
        thread::sleep(Duration::from_millis(500));
        if signal(pid, 0) {
            thread::sleep(Duration::from_secs(1));
            if signal(pid, 0) {
                signal(pid, libc::SIGKILL);
            }
        }
    }

    let _ = fs::remove_file(&pid_path);
    Ok(true)
}

#[cfg(unix)]
fn signal(pid: i32, sig: libc::c_int) -> bool {
    unsafe { libc::kill(pid, sig) == 0 }
}

#[cfg(not(unix))]
pub fn stop_daemon() -> Result<bool> {
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::crawler::IgnoreSet;
    use crate::index::store::IndexStore;
    use tempfile::TempDir;

    fn setup_with_interval(interval: Duration) -> (TempDir, Reindexer) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/Plan.txt"), b"x").unwrap();

        let store = IndexStore::open(&dir.path().join("crawl.db")).unwrap();
        let crawler = Crawler::new(&root, store, IgnoreSet::default());
        let reindexer = Reindexer::new(
            crawler,
            dir.path().join("trie.dat"),
            interval,
        );
        (dir, reindexer)
    }

    fn setup() -> (TempDir, Reindexer) {
        setup_with_interval(Duration::from_millis(20))
    }

    #[test]
    fn test_run_cycle_writes_snapshot() {
        let (_dir, reindexer) = setup();
        let stats = reindexer.run_cycle().unwrap();
        assert_eq!(stats.files, 1);

        let mut trie = Trie::new();
        assert!(trie.load(reindexer.snapshot_path()).unwrap());
        assert!(trie.search("Plan.txt"));
    }

    #[test]
    fn test_snapshot_drops_deleted_files() {
        let (dir, reindexer) = setup();
        reindexer.run_cycle().unwrap();

        fs::remove_file(dir.path().join("root/docs/Plan.txt")).unwrap();
        fs::write(dir.path().join("root/docs/Next.txt"), b"x").unwrap();
        reindexer.run_cycle().unwrap();

        let mut trie = Trie::new();
        trie.load(reindexer.snapshot_path()).unwrap();
        assert!(!trie.search("Plan.txt"));
        assert!(trie.search("Next.txt"));
    }

    #[test]
    fn test_spawned_loop_produces_snapshot() {
        // Long interval so the thread sleeps once the first cycle is done
        let (_dir, reindexer) = setup_with_interval(Duration::from_secs(3600));
        let snapshot = reindexer.snapshot_path().to_path_buf();
        let _handle = reindexer.spawn().unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !snapshot.exists() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(snapshot.exists());
    }

    #[test]
    fn test_failed_cycle_is_reported() {
        let (dir, reindexer) = setup();
        fs::remove_dir_all(dir.path().join("root")).unwrap();

        assert!(!reindexer.run_cycle_logged());
        assert!(!reindexer.snapshot_path().exists());
    }

    #[test]
    fn test_loop_keeps_running_after_failed_cycles() {
        let (dir, reindexer) = setup();
        let root = dir.path().join("root");
        fs::remove_dir_all(&root).unwrap();

        let snapshot = reindexer.snapshot_path().to_path_buf();
        let handle = reindexer.spawn().unwrap();

        // Several cycles fail against the missing root
        thread::sleep(Duration::from_millis(200));
        assert!(!handle.is_finished());
        assert!(!snapshot.exists());

        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("Back.txt"), b"x").unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !snapshot.exists() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(snapshot.exists());
        assert!(!handle.is_finished());
    }

    #[test]
    fn test_default_interval_is_five_minutes() {
        assert_eq!(DEFAULT_REINDEX_INTERVAL, Duration::from_secs(300));
        assert_eq!(AppConfig::default().reindex_interval(), DEFAULT_REINDEX_INTERVAL);
    }
}
