use hamsearch_core::config::SearchConfig;
use hamsearch_core::{CancelToken, Reporter, RunStats, SearchError, SearchProgress, SearchSession};

use anyhow::anyhow;
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "hamsearch.toml";

/// Searches for hex-encoded inputs whose digest is close to a target digest.
///
/// Reads fixed-size chunks from SOURCE, hashes the hex encoding of each chunk
/// and of its single-byte complements, and reports every new lowest Hamming
/// distance. Stops on Ctrl-C and prints throughput statistics.
#[derive(Parser, Debug)]
#[command(name = "hamsearch", version, about, long_about = None)]
struct Cli {
    /// Byte stream to draw chunks from (e.g. /dev/urandom)
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// TOML configuration file (defaults to ./hamsearch.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Stop after this many hashes instead of waiting for Ctrl-C
    #[arg(long, value_name = "N")]
    max_hashes: Option<u64>,
}

fn load_config(cli: &Cli) -> Result<SearchConfig, anyhow::Error> {
    let mut config = match &cli.config_file {
        Some(config_path) => {
            tracing::info!("Loading configuration from {config_path:?}");
            SearchConfig::load_from_file(config_path)?
        }
        None => {
            let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_config_path.exists() {
                tracing::info!("Loading default configuration from {default_config_path:?}");
                SearchConfig::load_from_file(&default_config_path)?
            } else {
                tracing::debug!("No configuration file, using built-in defaults");
                SearchConfig::default()
            }
        }
    };

    if let Some(max_hashes) = cli.max_hashes {
        config.max_hashes = Some(max_hashes);
    }
    Ok(config)
}

/// How long an interrupted search may take to notice before the process exits
/// on its own.
const STOP_GRACE: Duration = Duration::from_secs(1);

/// Hands the final summary to exactly one of the search task and the
/// interrupt listener.
#[derive(Clone, Default)]
struct SummaryClaim(Arc<AtomicBool>);

impl SummaryClaim {
    fn take(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

struct Interrupts {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl Interrupts {
    #[cfg(unix)]
    fn listen() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            signal: signal(SignalKind::interrupt())?,
        })
    }

    #[cfg(not(unix))]
    fn listen() -> std::io::Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(&mut self) -> bool {
        self.signal.recv().await.is_some()
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> bool {
        match tokio::signal::ctrl_c().await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("Unable to listen for interrupt signal: {}", err);
                false
            }
        }
    }
}

/// Cancels the search on the first interrupt. If the search is stuck in a read
/// and does not finish within [`STOP_GRACE`], or a second interrupt arrives,
/// prints the summary from the published counters and exits.
async fn watch_interrupts(
    mut interrupts: Interrupts,
    cancel: CancelToken,
    progress: SearchProgress,
    claim: SummaryClaim,
) {
    if !interrupts.recv().await {
        return;
    }
    tracing::info!("Interrupt received, stopping search");
    cancel.cancel();

    tokio::select! {
        _ = interrupts.recv() => tracing::warn!("Second interrupt, not waiting for the search"),
        _ = tokio::time::sleep(STOP_GRACE) => {
            tracing::warn!("Search did not stop within {:?}, likely blocked on input", STOP_GRACE)
        }
    }
    if !claim.take() {
        // the search task is already printing its own summary
        return;
    }
    let stats = progress.snapshot();
    if let Err(err) = Reporter::new(std::io::stdout()).summary(&stats) {
        tracing::error!("Failed to write summary: {}", err);
    }
    std::process::exit(0);
}

/// Unrecoverable search failures end the process without any further output.
fn abort_with(err: SearchError) -> ! {
    tracing::error!("Search aborted: {}", err);
    eprintln!("{err}");
    std::process::abort();
}

async fn run(cli: Cli) -> Result<RunStats, anyhow::Error> {
    let config = load_config(&cli)?.validate()?;
    tracing::debug!("Effective configuration: {config:?}");

    let source =
        File::open(&cli.source).map_err(|e| anyhow!("{}: {}", cli.source.display(), e))?;

    let interrupts = Interrupts::listen().map_err(|e| anyhow!("signal(SIGINT): {e}"))?;
    let cancel = CancelToken::new();
    let claim = SummaryClaim::default();
    let mut session = SearchSession::from_config(&config, config.algorithm.build());
    tokio::spawn(watch_interrupts(
        interrupts,
        cancel.clone(),
        session.progress(),
        claim.clone(),
    ));

    let search = tokio::task::spawn_blocking(move || {
        let mut reporter = Reporter::new(std::io::stdout());
        let (stats, _reason) = match session.run(BufReader::new(source), &mut reporter, &cancel) {
            Ok(outcome) => outcome,
            Err(err) => abort_with(err),
        };
        if claim.take() {
            reporter.summary(&stats)?;
        }
        Ok::<_, std::io::Error>(stats)
    });

    let stats = search.await??;
    Ok(stats)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(cli).await {
        Ok(stats) => {
            tracing::debug!("Finished: {stats:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
