//! Client for the reporting service's campaign snapshot.

use async_trait::async_trait;
use zoneguard_core::gateway::{snippet, GatewayError, ReportingSource};
use zoneguard_core::recommendation::PerformanceSnapshot;

use crate::config::ReportingConfig;
use crate::response::transport_error;

/// HTTP client for the reporting service.
pub struct ReportingClient {
    client: reqwest::Client,
    config: ReportingConfig,
}

impl ReportingClient {
    pub fn new(config: ReportingConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

/// Parse a snapshot body. Accepts the snapshot object or a bare campaign
/// array.
pub fn parse_snapshot(status: u16, body: &str) -> Result<PerformanceSnapshot, GatewayError> {
    if !(200..300).contains(&status) {
        return Err(GatewayError::Status {
            status,
            body: snippet(body),
        });
    }
    let malformed = || GatewayError::Malformed {
        status,
        body: snippet(body),
    };
    let value: serde_json::Value = serde_json::from_str(body).map_err(|_| malformed())?;
    let value = match value {
        serde_json::Value::Array(campaigns) => serde_json::json!({ "campaigns": campaigns }),
        other => other,
    };
    serde_json::from_value(value).map_err(|_| malformed())
}

#[async_trait]
impl ReportingSource for ReportingClient {
    async fn snapshot(&self, date_range: Option<&str>) -> Result<PerformanceSnapshot, GatewayError> {
        let Some(base_url) = self.config.base_url.as_deref() else {
            return Err(GatewayError::Unconfigured(
                "missing REPORTING_BASE_URL".into(),
            ));
        };

        let url = format!("{base_url}{}", self.config.snapshot_path);
        let mut request = self.client.get(&url);
        if let Some(range) = date_range.map(str::trim).filter(|r| !r.is_empty()) {
            request = request.query(&[("dateRange", range)]);
        }
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        let snapshot = parse_snapshot(status, &body)?;
        tracing::debug!(
            campaigns = snapshot.campaigns.len(),
            date_range,
            "Fetched reporting snapshot",
        );
        Ok(snapshot)
    }
}
