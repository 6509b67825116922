use beacon_core::Measurement;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::reporter::Reporter;
use crate::scanner::ScanEvent;
use crate::session::{Outcome, ScanSession};
use crate::state::RelayState;

/// Feeds scan events through the session and forwards accepted readings.
///
/// This task is the only owner of the session, so sequencer state never
/// crosses threads. Returns when cancelled or when the scanner goes away.
pub async fn run_session(
    mut scan_rx: mpsc::Receiver<ScanEvent>,
    mut session: ScanSession,
    measurement_tx: mpsc::Sender<Measurement>,
    state: RelayState,
    cancel: CancellationToken,
) {
    info!("Scan session task started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Scan session task shutting down");
                break;
            }
            event = scan_rx.recv() => {
                let Some(event) = event else {
                    info!("Scanner closed, scan session task shutting down");
                    break;
                };

                match event {
                    ScanEvent::SessionStarted { source } => {
                        session.begin(&source);
                        info!(%source, active = session.active_sources(), "Scan session started");
                        state.session_started().await;
                    }
                    ScanEvent::SessionEnded { source } => {
                        session.end(&source);
                        info!(%source, tracked = session.tracked_devices(), "Scan session ended");
                    }
                    ScanEvent::Advertisement { source, advertisement: adv } => {
                        let outcome = session.process(&source, &adv);
                        state.record_outcome(&outcome).await;

                        if let Outcome::Accepted(measurement) = outcome {
                            info!(
                                %source,
                                address = %adv.address,
                                kind = ?measurement.kind,
                                counter = measurement.counter,
                                value = measurement.value,
                                "New measurement"
                            );
                            if measurement_tx.send(measurement).await.is_err() {
                                warn!("Reporter channel closed, dropping measurement");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Hands every accepted measurement to the reporter, one at a time.
///
/// Failures are logged and counted; nothing is retried.
pub async fn run_reporter<R: Reporter>(
    reporter: R,
    mut measurement_rx: mpsc::Receiver<Measurement>,
    state: RelayState,
    cancel: CancellationToken,
) {
    info!("Reporter task started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Reporter task shutting down");
                break;
            }
            measurement = measurement_rx.recv() => {
                let Some(measurement) = measurement else {
                    info!("Measurement channel closed, reporter task shutting down");
                    break;
                };

                match reporter.report(&measurement).await {
                    Ok(response) => {
                        info!(
                            status = response.status,
                            body = %response.body,
                            counter = measurement.counter,
                            "Measurement reported"
                        );
                        state.record_response(response).await;
                    }
                    Err(e) => {
                        error!(error = %e, counter = measurement.counter, "Failed to report measurement");
                        state.record_failure().await;
                    }
                }
            }
        }
    }
}
