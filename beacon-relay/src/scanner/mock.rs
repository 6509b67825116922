use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beacon_core::{Advertisement, BeaconUuid, DeviceAddress, IBeaconFrame, MeasurementKind};
use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{ScanEvent, Scanner};

/// Identifier the sensor boards broadcast.
pub const BOARD_UUID: BeaconUuid = BeaconUuid(*b"EPSG-GTI-PROY-3A");
/// Local name the sensor boards advertise.
pub const BOARD_NAME: &str = "GTI";
/// Calibrated power the boards put in the frame.
const BOARD_TX_POWER: i8 = -53;

/// Mock scanner that plays the part of a single sensor board.
///
/// Readings alternate between gas and temperature. Each reading gets the next
/// counter value and is broadcast `repeats` times before the next one.
pub struct MockScanner {
    interval: Duration,
    repeats: u32,
    strip_flags: bool,
    board: Arc<MockBoard>,
}

impl MockScanner {
    pub fn new(interval_ms: u64, repeats: u32, strip_flags: bool) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            repeats: repeats.max(1),
            strip_flags,
            board: Arc::new(MockBoard::new()),
        }
    }

    pub fn address(&self) -> DeviceAddress {
        self.board.address
    }
}

/// A simulated board with a stable address and a rolling counter.
struct MockBoard {
    address: DeviceAddress,
    counter: AtomicU8,
}

impl MockBoard {
    fn new() -> Self {
        let mut rng = rand::rng();
        let mut address = [0u8; 6];
        rng.fill(&mut address);
        // locally administered, unicast
        address[0] = (address[0] | 0x02) & 0xFE;

        Self {
            address: DeviceAddress(address),
            counter: AtomicU8::new(0),
        }
    }

    fn next_frame(&self) -> IBeaconFrame {
        let mut rng = rand::rng();
        let counter = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        let (kind, value) = if counter % 2 == 1 {
            (MeasurementKind::Gas, rng.random_range(120..=160))
        } else {
            (MeasurementKind::Temperature, rng.random_range(-20..=5))
        };

        IBeaconFrame::new(BOARD_UUID, kind.major(counter), value, BOARD_TX_POWER)
    }

    fn advertisement(&self, bytes: &[u8]) -> Advertisement {
        let mut rng = rand::rng();

        Advertisement {
            address: self.address,
            name: Some(BOARD_NAME.into()),
            rssi: rng.random_range(-85..=-40),
            bytes: bytes.into(),
            received_at: jiff::Timestamp::now(),
        }
    }
}

#[async_trait]
impl Scanner for MockScanner {
    type Error = std::convert::Infallible;

    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<ScanEvent>, Self::Error> {
        let (tx, rx) = mpsc::channel(100);

        let board = Arc::clone(&self.board);
        let interval = self.interval;
        let repeats = self.repeats;
        let strip_flags = self.strip_flags;

        info!(
            address = %board.address,
            interval_ms = interval.as_millis() as u64,
            repeats,
            strip_flags,
            "Starting mock scanner"
        );

        tokio::spawn(async move {
            let source = format!("mock:{}", board.address);
            if tx
                .send(ScanEvent::SessionStarted {
                    source: source.clone(),
                })
                .await
                .is_err()
            {
                return;
            }

            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Mock scanner shutting down");
                        let _ = tx.send(ScanEvent::SessionEnded { source }).await;
                        break;
                    }
                    _ = ticker.tick() => {
                        let frame = board.next_frame();
                        let bytes = if strip_flags {
                            frame.to_stripped_bytes()
                        } else {
                            frame.to_bytes().to_vec()
                        };

                        for _ in 0..repeats {
                            let event = ScanEvent::Advertisement {
                                source: source.clone(),
                                advertisement: board.advertisement(&bytes),
                            };
                            if tx.send(event).await.is_err() {
                                info!("Channel closed, mock scanner shutting down");
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}
