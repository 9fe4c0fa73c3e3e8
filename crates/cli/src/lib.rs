//! CLI for the fio Prometheus exporter.
//!
//! This crate parses the command line, sets up logging, starts the scrape
//! endpoint and replays one series of fio results into it.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Parser, ValueEnum};
use fio_exporter_core::{server, MetricRegistry, Playback, TokioPacer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Replay fio JSON results as Prometheus metrics.
#[derive(Parser, Debug)]
#[command(name = "fio-exporter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Combination of block size and rw operation in fio, e.g. 4k_randread.
    pub series: String,

    /// Directory where the fio result JSON files are stored.
    #[arg(short, long, env = "FIO_EXPORTER_DIR", default_value = ".")]
    pub directory: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Port the metrics endpoint listens on.
    #[arg(short, long, env = "FIO_EXPORTER_PORT", default_value_t = server::DEFAULT_PORT)]
    pub port: u16,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Exit once every file has been published instead of serving the last
    /// values until interrupted.
    #[arg(long)]
    pub exit_when_done: bool,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Series substring selecting the result files.
    pub series: String,
    /// Directory holding the result files.
    pub directory: PathBuf,
    /// Address the metrics endpoint binds.
    pub listen: SocketAddr,
    /// Debug logging.
    pub debug: bool,
    /// Log line format.
    pub log_format: LogFormat,
    /// Stop after playback.
    pub exit_when_done: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            series: cli.series,
            directory: cli.directory,
            listen: SocketAddr::from(([0, 0, 0, 0], cli.port)),
            debug: cli.debug,
            log_format: cli.log_format,
            exit_when_done: cli.exit_when_done,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the `--debug` flag.
pub fn init_tracing(debug: bool, format: LogFormat) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Serve metrics and replay the configured series.
///
/// # Errors
///
/// Returns an error if the endpoint cannot bind, the directory cannot be
/// listed, or any result file fails to parse.
pub async fn execute(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(MetricRegistry::new());

    let (addr, server) = server::start_server(config.listen, Arc::clone(&registry))
        .await
        .context("starting metrics endpoint")?;
    debug!(%addr, "Metrics endpoint ready");

    let mut playback = Playback::new(registry, TokioPacer);
    playback
        .run(&config.series, &config.directory)
        .await
        .with_context(|| format!("replaying series {}", config.series))?;

    if config.exit_when_done {
        server.abort();
        return Ok(());
    }

    info!(%addr, "Playback finished, serving last values until interrupted");
    tokio::select! {
        joined = server => {
            joined
                .context("metrics endpoint task panicked")?
                .context("serving metrics")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for shutdown signal")?;
            info!("Shutting down");
        }
    }
    Ok(())
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if any stage fails.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(cli.debug, cli.log_format);
    debug!(
        series = %cli.series,
        directory = %cli.directory.display(),
        debug = cli.debug,
        port = cli.port,
        "args"
    );

    execute(Config::from(cli)).await
}
