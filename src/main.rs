//! Binary entrypoint for the voltbot CLI.
//!
//! Commands:
//! - `start` - load state and run the autosave (and optional backup) loops
//! - `init` - create a starter `config.toml` and the data directory
//! - `status` - print a per-server summary of the persisted state
//! - `backup [--name <label>]` - take a manual snapshot of the data dir
//!
//! See the library crate docs for module-level details: `voltbot::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use voltbot::config::Config;
use voltbot::state::backup::BackupManager;
use voltbot::state::{self, store, BotContext};

#[derive(Parser)]
#[command(name = "voltbot")]
#[command(about = "Economy and guild state engine for chat-platform bots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Load state and run until interrupted, flushing periodically
    Start,
    /// Initialize a new configuration file and data directory
    Init,
    /// Show a summary of the persisted state
    Status,
    /// Create a manual backup snapshot
    Backup {
        /// Optional label recorded in the backup metadata
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes it)
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            info!("Starting voltbot v{}", env!("CARGO_PKG_VERSION"));

            let data_dir = Path::new(&config.storage.data_dir);
            store::ensure_data_dir(data_dir).await?;
            let ctx = Arc::new(BotContext::new(data_dir));
            ctx.load_all().await;

            let autosave = state::run_autosave(
                Arc::clone(&ctx),
                config.storage.autosave_interval_secs,
            );
            let backup_task = config.backup.enabled.then(|| {
                spawn_backup_loop(
                    config.storage.data_dir.clone(),
                    config.backup.dir.clone(),
                    config.backup.interval_secs,
                    config.backup.max_backups,
                )
            });
            info!(
                "State loaded from {}; autosave every {}s",
                config.storage.data_dir, config.storage.autosave_interval_secs
            );

            tokio::signal::ctrl_c().await?;
            info!("Shutting down, flushing state");
            autosave.abort();
            if let Some(task) = backup_task {
                task.abort();
            }
            ctx.save_all().await?;
        }
        Commands::Init => {
            info!("Initializing new voltbot configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let config = Config::load(&cli.config).await?;
            store::ensure_data_dir(Path::new(&config.storage.data_dir)).await?;
            info!("Data directory ready at {}", config.storage.data_dir);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            print_status(&config).await;
        }
        Commands::Backup { name } => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let mut manager = BackupManager::new(
                config.storage.data_dir.clone().into(),
                config.backup.dir.clone().into(),
            )?;
            let metadata = manager.create_backup(name)?;
            println!(
                "Backup {} written ({} bytes, sha256 {})",
                metadata.id, metadata.size_bytes, metadata.checksum
            );
            let removed = manager.prune(config.backup.max_backups)?;
            if removed > 0 {
                println!("Pruned {removed} old backup(s)");
            }
        }
    }

    Ok(())
}

/// Periodic snapshot + prune. Each tick builds a fresh `BackupManager` so
/// metadata written by manual `backup` runs is picked up.
fn spawn_backup_loop(
    data_dir: String,
    backup_dir: String,
    interval_secs: u64,
    max_backups: usize,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(60)));
        ticker.tick().await; // skip the immediate first tick
        loop {
            ticker.tick().await;
            let data_dir = data_dir.clone();
            let backup_dir = backup_dir.clone();
            let result = tokio::task::spawn_blocking(move || {
                let mut manager = BackupManager::new(data_dir.into(), backup_dir.into())?;
                manager.create_backup(None)?;
                manager.prune(max_backups)
            })
            .await;
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("scheduled backup failed: {e}"),
                Err(e) => warn!("scheduled backup task panicked: {e}"),
            }
        }
    })
}

/// Read the raw documents and print per-file summaries. Goes through the
/// store codec rather than the managers so `status` stays read-only.
async fn print_status(config: &Config) {
    let data_dir = Path::new(&config.storage.data_dir);
    println!("voltbot v{}", env!("CARGO_PKG_VERSION"));
    println!("data dir: {}", config.storage.data_dir);
    for file in ["economy.json", "jobs.json", "guilds.json", "achievements.json"] {
        let path = data_dir.join(file);
        match store::read_document::<serde_json::Value>(&path).await {
            Ok(doc) => {
                let servers = doc
                    .get("servers")
                    .and_then(|s| s.as_object())
                    .map(|s| s.len())
                    .unwrap_or(0);
                println!("  {file}: {servers} server(s)");
            }
            Err(e) if e.is_missing() => println!("  {file}: not created yet"),
            Err(e) => println!("  {file}: unreadable ({e})"),
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.as_str())
            .unwrap_or("info")
            .parse()
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);

    let log_file = config.as_ref().and_then(|c| c.logging.file.clone());
    if let Some(file) = log_file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let sink = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Echo to the console only when stdout is a terminal
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = sink.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
