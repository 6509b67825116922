use std::time::Duration;

use async_trait::async_trait;
use beacon_core::{Measurement, MeasurementReport};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use super::{ReportResponse, Reporter};

#[derive(Debug, thiserror::Error)]
pub enum HttpReporterError {
    #[error("failed to encode measurement: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request to measurement endpoint failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// POSTs every measurement as JSON to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReporter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, HttpReporterError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Reporter for HttpReporter {
    type Error = HttpReporterError;

    #[instrument(name = "report", skip(self), fields(endpoint = %self.endpoint))]
    async fn report(&self, measurement: &Measurement) -> Result<ReportResponse, Self::Error> {
        let body = serde_json::to_vec(&MeasurementReport::from(measurement))?;

        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        debug!(status, body = %body, "Measurement endpoint answered");

        Ok(ReportResponse { status, body })
    }
}
