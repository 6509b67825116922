use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use beacon_core::Measurement;
use serde::Serialize;

use crate::reporter::ReportResponse;
use crate::session::Outcome;

/// Point-in-time copy of the relay counters, served on `/stats`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelayStats {
    pub sessions: u64,
    pub accepted: u64,
    pub duplicates: u64,
    pub filtered: u64,
    pub rejected: u64,
    pub reported: u64,
    pub report_failures: u64,
    pub last_measurement: Option<Measurement>,
    pub last_response: Option<ReportResponse>,
    pub uptime_secs: u64,
}

/// Shared counters for the scan and report tasks.
pub struct RelayState {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    stats: RelayStats,
    startup_time: Instant,
}

impl RelayState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                stats: RelayStats::default(),
                startup_time: Instant::now(),
            })),
        }
    }

    /// Record that a new scan session started.
    pub async fn session_started(&self) {
        let mut inner = self.inner.lock().await;
        inner.stats.sessions += 1;
    }

    /// Record what the scan session made of one advertisement.
    pub async fn record_outcome(&self, outcome: &Outcome) {
        let mut inner = self.inner.lock().await;
        let stats = &mut inner.stats;
        match outcome {
            Outcome::Accepted(measurement) => {
                stats.accepted += 1;
                stats.last_measurement = Some(*measurement);
            }
            Outcome::Duplicate(_) => stats.duplicates += 1,
            Outcome::Filtered => stats.filtered += 1,
            Outcome::Rejected(_) => stats.rejected += 1,
        }
    }

    /// Record the endpoint's answer to a report.
    pub async fn record_response(&self, response: ReportResponse) {
        let mut inner = self.inner.lock().await;
        inner.stats.reported += 1;
        inner.stats.last_response = Some(response);
    }

    /// Record a report that never got an answer.
    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.stats.report_failures += 1;
    }

    pub async fn snapshot(&self) -> RelayStats {
        let inner = self.inner.lock().await;
        RelayStats {
            uptime_secs: inner.startup_time.elapsed().as_secs(),
            ..inner.stats.clone()
        }
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RelayState {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
