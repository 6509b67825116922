use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use beacon_core::{Measurement, MeasurementReport};
use tracing::info;

use super::{ReportResponse, Reporter};

/// Keeps reports in memory instead of sending them.
///
/// Used for dry runs and as the reference implementation in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    reports: Arc<Mutex<Vec<MeasurementReport>>>,
}

impl MemoryReporter {
    pub fn reports(&self) -> Vec<MeasurementReport> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Reporter for MemoryReporter {
    type Error = Infallible;

    async fn report(&self, measurement: &Measurement) -> Result<ReportResponse, Self::Error> {
        let report = MeasurementReport::from(measurement);
        info!(?report, "Recorded measurement (dry run)");

        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(report);

        Ok(ReportResponse {
            status: 200,
            body: String::new(),
        })
    }
}
