use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::subscriber as tracing_subscriber_global;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use ytmusic_playlist_importer as lib;
use lib::api::auth::BrowserAuth;
use lib::api::ytmusic::YtMusicProvider;
use lib::config::Config;
use lib::delay::TokioSleeper;
use lib::error::ImportError;
use lib::importer::{load_export, Importer};

const LOG_FILE_NAME: &str = "ytmusic-playlist-importer.log";

/// Import exported playlists (JSON) into YouTube Music.
#[derive(Parser)]
#[command(name = "ytmusic-playlist-importer", version)]
struct Cli {
    /// Path to the JSON file containing exported playlists
    #[arg(long, alias = "playlists_file", value_name = "FILE", default_value = "playlists.json")]
    playlists_file: PathBuf,

    /// Allow adding tracks that are already in the target playlist
    #[arg(long, alias = "allow_duplicates")]
    allow_duplicates: bool,

    /// Delete existing playlists with the same name before creating new ones
    #[arg(long, alias = "delete_if_exists")]
    delete_if_exists: bool,

    /// Read settings from a TOML file instead of `.env` / the environment
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Logs go to both stdout and `<log_dir>/ytmusic-playlist-importer.log`.
fn init_logging(cfg: &Config) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&cfg.log_dir)
        .with_context(|| format!("creating log directory {}", cfg.log_dir.display()))?;

    let _ = LogTracer::init();
    let file_appender = tracing_appender::rolling::never(&cfg.log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Honor RUST_LOG if set, otherwise use the configured level.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.log_filter()));

    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer);

    tracing_subscriber_global::set_global_default(subscriber)
        .context("failed to set global tracing subscriber")?;
    Ok(guard)
}

fn init_provider(cfg: &Config, allow_duplicates: bool) -> Result<YtMusicProvider, ImportError> {
    let init = || -> Result<YtMusicProvider> {
        log::info!("Using headers file: {}", cfg.headers_raw_file.display());
        BrowserAuth::setup(&cfg.headers_raw_file, &cfg.auth_generated_file)?;
        let auth = BrowserAuth::load(&cfg.auth_generated_file)?;
        Ok(YtMusicProvider::new(auth)?.allow_duplicates(allow_duplicates))
    };
    init().map_err(ImportError::Initialization)
}

async fn run(cli: &Cli, cfg: &Config) -> Result<(), ImportError> {
    let playlists = load_export(&cli.playlists_file)?;
    log::info!("Loaded {} playlists from {}", playlists.len(), cli.playlists_file.display());

    let provider = init_provider(cfg, cli.allow_duplicates)?;
    let sleeper = TokioSleeper;
    let options = cfg.import_options(cli.allow_duplicates, cli.delete_if_exists);
    Importer::new(&provider, &sleeper, options).run(&playlists).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };

    let guard = init_logging(&cfg)?;
    log::info!("Logging initialized. Log file: {}", cfg.log_dir.join(LOG_FILE_NAME).display());

    if let Err(e) = run(&cli, &cfg).await {
        log::error!("{}", e);
        // Flush the file writer before exiting.
        drop(guard);
        std::process::exit(1);
    }
    Ok(())
}
