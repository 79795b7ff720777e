//! Client for the ad network's campaign and excluded-zones resources.

use async_trait::async_trait;
use zoneguard_core::campaign_identity::ProviderCampaign;
use zoneguard_core::gateway::{ExcludedZones, GatewayError, ProviderGateway, RemovalAck};

use crate::config::ProviderConfig;
use crate::response::{interpret_campaigns, interpret_removal, interpret_zones, transport_error};

/// HTTP client for one ad network account.
pub struct BlacklistClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

/// Credentials resolved for a single call.
struct Credentials<'a> {
    base_url: &'a str,
    token: &'a str,
}

impl BlacklistClient {
    /// Create a client whose requests time out after `config.timeout`.
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn credentials(&self) -> Result<Credentials<'_>, GatewayError> {
        match (&self.config.base_url, &self.config.token) {
            (Some(base_url), Some(token)) => Ok(Credentials { base_url, token }),
            _ => Err(GatewayError::Unconfigured(format!(
                "missing {}",
                self.config.missing().join(", ")
            ))),
        }
    }

    /// Send a request and read the whole body.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), GatewayError> {
        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        Ok((status, body))
    }
}

#[async_trait]
impl ProviderGateway for BlacklistClient {
    fn provider_name(&self) -> &str {
        &self.config.name
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn list_campaigns(&self) -> Result<Vec<ProviderCampaign>, GatewayError> {
        let creds = self.credentials()?;
        let url = self.config.campaigns_url(creds.base_url);
        let (status, body) = self
            .send(self.client.get(&url).bearer_auth(creds.token))
            .await?;
        let campaigns = interpret_campaigns(status, &body)?;
        tracing::debug!(count = campaigns.len(), "Fetched provider campaign listing");
        Ok(campaigns)
    }

    async fn fetch_excluded_zones(
        &self,
        provider_campaign_id: &str,
    ) -> Result<ExcludedZones, GatewayError> {
        let creds = self.credentials()?;
        let url = self.config.zones_url(creds.base_url, provider_campaign_id);
        let (status, body) = self
            .send(self.client.get(&url).bearer_auth(creds.token))
            .await?;
        let zones = interpret_zones(status, &body, self.config.zones_json_path.as_deref())?;
        tracing::debug!(
            campaign_id = provider_campaign_id,
            status,
            zones = zones.zones.len(),
            strategy = ?zones.strategy,
            "Fetched excluded zones",
        );
        Ok(zones)
    }

    async fn remove_exclusion(
        &self,
        provider_campaign_id: &str,
        zone_ids: &[String],
    ) -> Result<RemovalAck, GatewayError> {
        let creds = self.credentials()?;
        let url = self.config.zones_url(creds.base_url, provider_campaign_id);
        let body = serde_json::json!({ "zone": zone_ids });
        let (status, text) = self
            .send(
                self.client
                    .delete(&url)
                    .bearer_auth(creds.token)
                    .json(&body),
            )
            .await?;
        let ack = interpret_removal(status, &text)?;
        tracing::info!(
            campaign_id = provider_campaign_id,
            zones = zone_ids.len(),
            status,
            "Removed zone exclusions",
        );
        Ok(ack)
    }
}
