use anyhow::Result;
use clap::{Parser, Subcommand};
use spotlight::index;
use spotlight::output::{self, Source};
use spotlight::query::{Searcher, merge_results};
use spotlight::server::{self, daemon, get_error_log_path, get_pid_path, is_daemon_running};
use spotlight::utils::{AppConfig, get_config_path};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spotlight")]
#[command(about = "Local file search over a prefix trie and a token index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a directory once and rebuild the trie snapshot
    Index {
        /// Directory to crawl (defaults to the configured root)
        path: Option<PathBuf>,
    },
    /// Search file names by prefix
    Search {
        query: String,

        /// Maximum trie results
        #[arg(short = 'n', long, default_value_t = spotlight::query::DEFAULT_TRIE_RESULTS)]
        limit: usize,

        /// Offset into the token index results
        #[arg(short, long, default_value_t = 0)]
        offset: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Only query the trie
        #[arg(long, conflicts_with = "index_only")]
        trie_only: bool,

        /// Only query the token index
        #[arg(long)]
        index_only: bool,
    },
    /// Run the periodic reindex daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    /// Show the active configuration
    Config {
        /// Write the active configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon in background
    Start,
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
    /// Run daemon in foreground (for debugging)
    Foreground,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Index { path } => {
            let root = path.unwrap_or_else(|| config.root.clone());
            index::build_index(&config, &root, false)?;
        }
        Commands::Search {
            query,
            limit,
            offset,
            json,
            trie_only,
            index_only,
        } => {
            let searcher = Searcher::from_config(&config)?;
            let trie = if index_only {
                Vec::new()
            } else {
                searcher.trie_search(&query, limit)
            };
            let tokens = if trie_only {
                Vec::new()
            } else {
                searcher.index_search(&query, offset)
            };

            if json {
                output::print_json(&merge_results(trie, tokens))?;
            } else {
                let color = !cli.no_color;
                if !index_only {
                    output::print_results(&trie, Source::Trie, color)?;
                }
                if !trie_only {
                    output::print_results(&tokens, Source::Index, color)?;
                }
            }
        }
        Commands::Daemon { action } => {
            handle_daemon_command(action, &config)?;
        }
        Commands::Config { init } => {
            if init {
                config.save()?;
            }
            println!("Config file: {}", get_config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn handle_daemon_command(action: DaemonAction, config: &AppConfig) -> Result<()> {
    match action {
        DaemonAction::Start => {
            if is_daemon_running() {
                println!("Daemon is already running");
                return Ok(());
            }

            println!("Starting spotlightd (root: {})...", config.root.display());
            daemon::daemonize(config)?;

            // Wait a moment for daemon to start
            std::thread::sleep(std::time::Duration::from_millis(500));

            if is_daemon_running() {
                println!("Daemon started (pid file: {})", get_pid_path().display());
            } else {
                println!(
                    "Daemon may have failed to start. Check {}",
                    get_error_log_path().display()
                );
            }
        }

        DaemonAction::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            println!("Stopping daemon...");
            daemon::stop_daemon()?;
            println!("Daemon stopped");
        }

        DaemonAction::Status => {
            if !server::is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            println!("spotlightd status:");
            println!("  Root: {}", config.root.display());
            println!("  Interval: {}s", config.reindex_interval().as_secs());
            println!("  Store: {}", config.store_path.display());
            println!("  Snapshot: {}", config.snapshot_path.display());
        }

        DaemonAction::Foreground => {
            if is_daemon_running() {
                println!("Daemon is already running in background. Stop it first with 'spotlight daemon stop'");
                return Ok(());
            }

            println!("Running daemon in foreground (Ctrl+C to stop)...");
            daemon::run_foreground(config)?;
        }
    }

    Ok(())
}
