use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use ozon_price_watcher::scheduler::format_countdown;
use ozon_price_watcher::{AppConfig, NotifierPlugin, PriceMonitor, SettingsStore, TelegramNotifier};

const COUNTDOWN_LOG_INTERVAL: Duration = Duration::from_secs(60);

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Watches Ozon seller prices and reports discrepancies to Telegram.
#[derive(Parser)]
#[command(name = "ozon-price-watcher", version, about)]
struct Cli {
    /// Path of the settings document (overrides `settings_path`)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run a single check and print its result
    Once,
    /// Check periodically until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.settings {
        config.settings_path = path.display().to_string();
    }

    let (_log_guard, filter) = init_tracing(&config)?;
    let settings = SettingsStore::new(&config.settings_path).load();
    apply_log_level(&filter, &settings.log_level);

    info!("Starting Ozon price watcher...");

    let notifier = Arc::new(TelegramNotifier::new(&config.telegram));
    info!("Reports are delivered by {} ({})", notifier.name(), notifier.plugin_type());

    let monitor = PriceMonitor::with_notifier(&config, notifier);
    monitor
        .set_update_callback(|result| info!("Status: {}", result.message))
        .await;

    let command = cli.command.unwrap_or(if settings.auto_start {
        Command::Watch
    } else {
        Command::Once
    });

    match command {
        Command::Once => {
            let result = monitor.run_once().await?;
            println!("{}", result.message);
        }
        Command::Watch => {
            monitor.start().await;

            let shutdown = tokio::signal::ctrl_c();
            tokio::pin!(shutdown);
            let mut countdown = tokio::time::interval(COUNTDOWN_LOG_INTERVAL);
            loop {
                tokio::select! {
                    signal = &mut shutdown => {
                        signal?;
                        break;
                    }
                    _ = countdown.tick() => {
                        if let Some(next_run) = monitor.next_run_at().await {
                            info!("Next check in {}", format_countdown(next_run - Local::now()));
                        }
                    }
                }
            }

            info!("Shutting down...");
            monitor.shutdown().await;
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<(WorkerGuard, FilterHandle)> {
    std::fs::create_dir_all(&config.logging.directory)?;
    let file_appender =
        tracing_appender::rolling::never(&config.logging.directory, &config.logging.file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Info until the settings are loaded and their level is applied
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    Ok((guard, handle))
}

fn apply_log_level(handle: &FilterHandle, log_level: &str) {
    // RUST_LOG wins over the persisted level
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return;
    }

    let filter = match EnvFilter::try_new(log_level.to_lowercase()) {
        Ok(filter) => filter,
        Err(e) => {
            warn!("Invalid log level {:?}: {}", log_level, e);
            return;
        }
    };
    if let Err(e) = handle.reload(filter) {
        warn!("Failed to apply log level: {}", e);
    }
}
