use std::path::PathBuf;
use std::time::Duration;

use beacon_core::BeaconUuid;
use beacon_relay::pipeline::{run_reporter, run_session};
use beacon_relay::{
    Config, HttpReporter, MemoryReporter, MockScanner, RelayState, Reporter, ReporterConfig,
    ScanSession, Scanner, ScannerConfig, TcpScanner, api,
};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "beacon_relay=info";

#[derive(Parser)]
#[command(name = "beacon-relay")]
#[command(about = "Relays iBeacon sensor readings to a measurement endpoint")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "beacon-relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    let beacon_uuid = config
        .relay
        .beacon_uuid
        .as_deref()
        .map(BeaconUuid::from_text)
        .transpose()
        .map_err(|e| color_eyre::eyre::eyre!("invalid beacon_uuid in configuration: {e}"))?;
    let session = ScanSession::new(config.relay.device_name.clone(), beacon_uuid);

    info!(
        device_name = ?config.relay.device_name,
        beacon_uuid = ?config.relay.beacon_uuid,
        http_addr = %config.server.http_addr,
        "Starting beacon-relay"
    );

    match &config.reporter {
        ReporterConfig::Http {
            endpoint,
            timeout_secs,
        } => {
            info!(%endpoint, timeout_secs, "Reporting over HTTP");
            let reporter = HttpReporter::new(endpoint.clone(), Duration::from_secs(*timeout_secs))?;
            run_relay(&config, session, reporter).await?;
        }
        ReporterConfig::Memory => {
            info!("Using in-memory reporter, nothing will be sent");
            run_relay(&config, session, MemoryReporter::default()).await?;
        }
    }

    Ok(())
}

async fn run_relay<R: Reporter>(
    config: &Config,
    session: ScanSession,
    reporter: R,
) -> color_eyre::Result<()> {
    match &config.scanner {
        ScannerConfig::Mock {
            interval_ms,
            repeats,
            strip_flags,
        } => {
            info!(interval_ms, repeats, strip_flags, "Using mock scanner");
            let scanner = MockScanner::new(*interval_ms, *repeats, *strip_flags);
            run_scanner(config, scanner, session, reporter).await
        }
        ScannerConfig::Tcp { addr } => {
            info!(%addr, "Using TCP scanner bridge");
            run_scanner(config, TcpScanner::new(*addr), session, reporter).await
        }
    }
}

async fn run_scanner<S: Scanner, R: Reporter>(
    config: &Config,
    scanner: S,
    session: ScanSession,
    reporter: R,
) -> color_eyre::Result<()> {
    let cancel = CancellationToken::new();
    let state = RelayState::new();

    let scan_rx = scanner.start(cancel.clone()).await?;
    let (measurement_tx, measurement_rx) = mpsc::channel(100);

    let session_handle = tokio::spawn(run_session(
        scan_rx,
        session,
        measurement_tx,
        state.clone(),
        cancel.clone(),
    ));

    let reporter_handle = tokio::spawn(run_reporter(
        reporter,
        measurement_rx,
        state.clone(),
        cancel.clone(),
    ));

    let http_addr = config.server.http_addr;
    let listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "HTTP server listening");

    let cancel_for_http = cancel.clone();

    tokio::select! {
        result = axum::serve(listener, api::router(state)).with_graceful_shutdown(async move {
            cancel_for_http.cancelled().await;
        }) => {
            if let Err(e) = result {
                error!(error = ?e, "HTTP server error");
            }
            info!("HTTP server shut down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }
    cancel.cancel();

    // Wait for background tasks to complete
    let _ = session_handle.await;
    let _ = reporter_handle.await;

    info!("beacon-relay shut down complete");
    Ok(())
}
