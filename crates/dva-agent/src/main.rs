//! DVA Agent Daemon
//!
//! Polls the task API for annotation-validation jobs, scores them, and
//! submits encrypted results, forever, until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod chat;
mod cipher;
mod config;
mod fetcher;
mod scheduler;
mod scoring;
mod store;
mod submitter;
#[cfg(test)]
mod testutil;
mod transport;

use dva_core::RateLimitState;

use chat::ChatClient;
use cipher::{AesGcmCipher, PayloadCipher};
use config::Config;
use fetcher::TaskFetcher;
use scheduler::Scheduler;
use scoring::RandomScoreProvider;
use store::{RequestHistory, ResultStore};
use submitter::TaskSubmitter;
use transport::{HttpTransport, Transport};

/// DVA agent - annotation validation bot
#[derive(Parser)]
#[command(name = "dva-agent")]
#[command(about = "Polls the task API and submits encrypted validation results", long_about = None)]
struct Cli {
    /// Directory holding token.txt / proxies.txt; results and request
    /// history are written here
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match Config::load(&cli.dir) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    info!(
        session_id = %uuid::Uuid::new_v4(),
        data_dir = %config.data_dir.display(),
        proxies = config.proxies.len(),
        "Starting DVA agent"
    );

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    let history = Arc::new(RequestHistory::new());
    let store = Arc::new(ResultStore::new(&config.data_dir));

    let transport: Arc<dyn Transport> =
        match HttpTransport::new(config.clone(), history.clone()) {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                error!(error = %e, "Failed to build HTTP transport");
                return ExitCode::FAILURE;
            }
        };

    // One process-lifetime key for all submissions
    let payload_cipher: Arc<dyn PayloadCipher> = Arc::new(AesGcmCipher::generate());
    let rate_limit = Arc::new(Mutex::new(RateLimitState::default()));

    let fetcher = TaskFetcher::new(transport.clone(), config.clone());
    let submitter = TaskSubmitter::new(
        transport.clone(),
        payload_cipher,
        Arc::new(RandomScoreProvider),
        config.clone(),
        rate_limit,
        cancel.clone(),
    )
    .with_payload_mode(config.payload_mode);
    let chat = ChatClient::new(transport, config.clone(), cancel.clone());

    let mut scheduler = Scheduler::new(
        fetcher,
        submitter,
        chat,
        store.clone(),
        config.clone(),
        cancel,
    );
    scheduler.run().await;

    // Graceful flush before exit
    match store.save() {
        Ok(path) => info!(path = %path.display(), results = store.len(), "Results saved"),
        Err(e) => error!(error = %e, "Failed to save results"),
    }
    match history.save(&config.data_dir) {
        Ok(path) => info!(path = %path.display(), requests = history.len(), "Request history saved"),
        Err(e) => error!(error = %e, "Failed to save request history"),
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}

fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, finishing current work");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
