pub mod mock;
pub mod tcp;

use async_trait::async_trait;
use beacon_core::Advertisement;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Events produced by a scanner.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// `source` began a scan session; its earlier sequencer state is stale.
    SessionStarted { source: String },
    /// One advertisement seen during `source`'s current session.
    Advertisement {
        source: String,
        advertisement: Advertisement,
    },
    /// `source`'s session ended; nothing it tracked is needed any more.
    SessionEnded { source: String },
}

/// Trait for sources of raw advertisements.
///
/// Implementations spawn background tasks that push [`ScanEvent`]s into an
/// mpsc channel whose receiver is returned from `start`. The tasks stop when
/// the cancellation token is cancelled.
#[async_trait]
pub trait Scanner: Send + Sync + 'static {
    /// Error type for this scanner implementation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start scanning.
    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<ScanEvent>, Self::Error>;
}
