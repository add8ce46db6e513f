//! Background reindex daemon
//!
//! The daemon re-crawls the configured root on a fixed interval, writing
//! the index store in place and replacing the trie snapshot after each pass.
//! Query processes pick up the new snapshot when they reload it.

pub mod daemon;

pub use daemon::Reindexer;

use std::path::PathBuf;

/// Runtime directory for the PID and error files
fn runtime_dir() -> PathBuf {
    // Try XDG_RUNTIME_DIR first (most secure, tmpfs-backed)
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir);
    }

    // Fall back to user's home directory
    if let Some(home) = dirs::home_dir() {
        return home.join(".local").join("run");
    }

    std::env::temp_dir()
}

/// Get the PID file path for the daemon
pub fn get_pid_path() -> PathBuf {
    runtime_dir().join("spotlightd.pid")
}

/// File the detached daemon writes fatal errors to
pub fn get_error_log_path() -> PathBuf {
    runtime_dir().join("spotlightd-error.log")
}

/// Check if the daemon is running
pub fn is_daemon_running() -> bool {
    read_pid().is_some_and(process_exists)
}

fn read_pid() -> Option<i32> {
    let pid_str = std::fs::read_to_string(get_pid_path()).ok()?;
    parse_pid(&pid_str)
}

/// Parse PID file contents. Zero and negative values address process groups
/// in `kill(2)`, so they are rejected.
pub(crate) fn parse_pid(contents: &str) -> Option<i32> {
    contents.trim().parse::<i32>().ok().filter(|&pid| pid > 0)
}

#[cfg(unix)]
fn process_exists(pid: i32) -> bool {
    // kill(pid, 0) only checks that the process exists
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(not(unix))]
fn process_exists(_pid: i32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid("1234\n"), Some(1234));
        assert_eq!(parse_pid(" 7 "), Some(7));
    }

    #[test]
    fn test_parse_pid_rejects_group_targets() {
        assert_eq!(parse_pid("0"), None);
        assert_eq!(parse_pid("-1"), None);
        assert_eq!(parse_pid("-4321"), None);
        assert_eq!(parse_pid("abc"), None);
        assert_eq!(parse_pid(""), None);
    }
}
