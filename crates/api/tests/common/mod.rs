#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use zoneguard_api::config::ServerConfig;
use zoneguard_api::router::build_app_router;
use zoneguard_api::state::AppState;
use zoneguard_core::campaign_identity::ProviderCampaign;
use zoneguard_core::gateway::{
    ExcludedZones, GatewayError, ProviderGateway, RemovalAck, ReportingSource,
};
use zoneguard_core::recommendation::PerformanceSnapshot;
use zoneguard_core::zone_extraction::ExtractionStrategy;
use zoneguard_events::EventBus;
use zoneguard_suppression::{
    InMemoryLedger, InMemoryMappingStore, SuppressionSettings, Suppressor,
};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        log_json: false,
    }
}

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

/// Ad network held in memory. Removals mutate the exclusion lists.
#[derive(Default)]
pub struct ScriptedGateway {
    configured: bool,
    listing: Vec<ProviderCampaign>,
    zones: Mutex<HashMap<String, BTreeSet<String>>>,
    failing: HashMap<String, GatewayError>,
}

impl ScriptedGateway {
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, id: &str, name: &str) -> Self {
        self.listing.push(ProviderCampaign {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_zones(self, campaign: &str, zones: &[&str]) -> Self {
        self.set_zones(campaign, zones);
        self
    }

    pub fn failing(mut self, campaign: &str, error: GatewayError) -> Self {
        self.failing.insert(campaign.to_string(), error);
        self
    }

    pub fn set_zones(&self, campaign: &str, zones: &[&str]) {
        self.zones.lock().unwrap().insert(
            campaign.to_string(),
            zones.iter().map(|z| z.to_string()).collect(),
        );
    }

    pub fn zones(&self, campaign: &str) -> BTreeSet<String> {
        self.zones
            .lock()
            .unwrap()
            .get(campaign)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self, campaign: &str) -> Result<(), GatewayError> {
        if !self.configured {
            return Err(GatewayError::Unconfigured("PROVIDER_TOKEN".into()));
        }
        match self.failing.get(campaign) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderGateway for ScriptedGateway {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn list_campaigns(&self) -> Result<Vec<ProviderCampaign>, GatewayError> {
        self.check("")?;
        Ok(self.listing.clone())
    }

    async fn fetch_excluded_zones(
        &self,
        provider_campaign_id: &str,
    ) -> Result<ExcludedZones, GatewayError> {
        self.check(provider_campaign_id)?;
        Ok(ExcludedZones {
            zones: self.zones(provider_campaign_id),
            status: 200,
            strategy: Some(ExtractionStrategy::NamedField),
        })
    }

    async fn remove_exclusion(
        &self,
        provider_campaign_id: &str,
        zone_ids: &[String],
    ) -> Result<RemovalAck, GatewayError> {
        self.check(provider_campaign_id)?;
        if let Some(zones) = self.zones.lock().unwrap().get_mut(provider_campaign_id) {
            for zone in zone_ids {
                zones.remove(zone);
            }
        }
        Ok(RemovalAck { status: 200 })
    }
}

/// Reporting service returning a fixed snapshot, or unconfigured.
#[derive(Default)]
pub struct ScriptedReporting {
    snapshot: Option<PerformanceSnapshot>,
}

impl ScriptedReporting {
    pub fn with_snapshot(snapshot: PerformanceSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }
}

#[async_trait]
impl ReportingSource for ScriptedReporting {
    async fn snapshot(&self, _date_range: Option<&str>) -> Result<PerformanceSnapshot, GatewayError> {
        self.snapshot
            .clone()
            .ok_or_else(|| GatewayError::Unconfigured("REPORTING_BASE_URL".into()))
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<ScriptedGateway>,
    pub ledger: Arc<InMemoryLedger>,
}

/// Build the full application router over in-memory stores.
///
/// Uses the same [`build_app_router`] as `main.rs` so integration tests
/// exercise the production middleware stack.
pub fn build_test_app(gateway: ScriptedGateway) -> TestApp {
    build_test_app_with(gateway, ScriptedReporting::default())
}

pub fn build_test_app_with(gateway: ScriptedGateway, reporting: ScriptedReporting) -> TestApp {
    let config = test_config();
    let gateway = Arc::new(gateway);
    let ledger = Arc::new(InMemoryLedger::new());

    let state = AppState {
        config: Arc::new(config.clone()),
        suppressor: Suppressor {
            ledger: ledger.clone(),
            mappings: Arc::new(InMemoryMappingStore::new()),
            gateway: gateway.clone(),
            reporting: Arc::new(reporting),
            events: Arc::new(EventBus::default()),
            settings: SuppressionSettings {
                concurrency: 2,
                call_timeout: Duration::from_secs(2),
            },
        },
    };

    TestApp {
        router: build_app_router(state, &config),
        gateway,
        ledger,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_json(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
