pub mod http;
pub mod memory;

use async_trait::async_trait;
use beacon_core::Measurement;
use serde::Serialize;

/// Answer from the measurement endpoint, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportResponse {
    /// Numeric HTTP status.
    pub status: u16,
    /// Full response body; empty when the server sent none.
    pub body: String,
}

/// Sink for accepted measurements.
///
/// Each call delivers exactly one measurement. Implementations do not retry;
/// a failed report is returned to the caller, which decides what to do.
#[async_trait]
pub trait Reporter: Send + Sync + 'static {
    /// Error type for this reporter implementation.
    type Error: std::error::Error + Send + Sync + 'static;

    async fn report(&self, measurement: &Measurement) -> Result<ReportResponse, Self::Error>;
}
