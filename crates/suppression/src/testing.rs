//! Scripted collaborators for orchestrator tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use zoneguard_core::campaign_identity::ProviderCampaign;
use zoneguard_core::gateway::{
    ExcludedZones, GatewayError, ProviderGateway, RemovalAck, ReportingSource,
};
use zoneguard_core::recommendation::PerformanceSnapshot;
use zoneguard_core::store::MappingStore;
use zoneguard_events::EventBus;

use crate::memory::{InMemoryLedger, InMemoryMappingStore};
use crate::settings::SuppressionSettings;
use crate::Suppressor;

/// Provider state held in memory. Removals mutate the exclusion lists.
#[derive(Default)]
pub struct FakeGateway {
    configured: bool,
    listing: Vec<ProviderCampaign>,
    listing_error: Option<GatewayError>,
    zones: Mutex<HashMap<String, BTreeSet<String>>>,
    fetch_errors: HashMap<String, GatewayError>,
    remove_errors: HashMap<String, GatewayError>,
    slow: HashSet<String>,
    listing_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    removals: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeGateway {
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, campaigns: &[(&str, &str)]) -> Self {
        self.listing = campaigns
            .iter()
            .map(|(id, name)| ProviderCampaign {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        self
    }

    pub fn failing_listing(mut self, error: GatewayError) -> Self {
        self.listing_error = Some(error);
        self
    }

    pub fn with_zones(self, campaign: &str, zones: &[&str]) -> Self {
        self.set_zones(campaign, zones);
        self
    }

    pub fn failing_fetch(mut self, campaign: &str, error: GatewayError) -> Self {
        self.fetch_errors.insert(campaign.to_string(), error);
        self
    }

    pub fn failing_removal(mut self, campaign: &str, error: GatewayError) -> Self {
        self.remove_errors.insert(campaign.to_string(), error);
        self
    }

    /// Fetches for `campaign` hang far longer than any test timeout.
    pub fn slow(mut self, campaign: &str) -> Self {
        self.slow.insert(campaign.to_string());
        self
    }

    pub fn set_zones(&self, campaign: &str, zones: &[&str]) {
        self.zones.lock().unwrap().insert(
            campaign.to_string(),
            zones.iter().map(|z| z.to_string()).collect(),
        );
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn removals(&self) -> Vec<(String, Vec<String>)> {
        self.removals.lock().unwrap().clone()
    }

    fn unconfigured_error() -> GatewayError {
        GatewayError::Unconfigured("missing PROVIDER_TOKEN".into())
    }
}

#[async_trait]
impl ProviderGateway for FakeGateway {
    fn provider_name(&self) -> &str {
        "fake"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn list_campaigns(&self) -> Result<Vec<ProviderCampaign>, GatewayError> {
        if !self.configured {
            return Err(Self::unconfigured_error());
        }
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        match &self.listing_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.listing.clone()),
        }
    }

    async fn fetch_excluded_zones(&self, campaign: &str) -> Result<ExcludedZones, GatewayError> {
        if !self.configured {
            return Err(Self::unconfigured_error());
        }
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = if self.slow.contains(campaign) {
            Duration::from_secs(30)
        } else {
            Duration::from_millis(10)
        };
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(e) = self.fetch_errors.get(campaign) {
            return Err(e.clone());
        }
        let zones = self
            .zones
            .lock()
            .unwrap()
            .get(campaign)
            .cloned()
            .unwrap_or_default();
        Ok(ExcludedZones {
            zones,
            status: 200,
            strategy: None,
        })
    }

    async fn remove_exclusion(
        &self,
        campaign: &str,
        zone_ids: &[String],
    ) -> Result<RemovalAck, GatewayError> {
        if !self.configured {
            return Err(Self::unconfigured_error());
        }
        if let Some(e) = self.remove_errors.get(campaign) {
            return Err(e.clone());
        }
        if let Some(zones) = self.zones.lock().unwrap().get_mut(campaign) {
            for zone in zone_ids {
                zones.remove(zone);
            }
        }
        self.removals
            .lock()
            .unwrap()
            .push((campaign.to_string(), zone_ids.to_vec()));
        Ok(RemovalAck { status: 200 })
    }
}

/// Reporting source returning a fixed snapshot, or unconfigured.
#[derive(Default)]
pub struct FakeReporting {
    snapshot: Option<PerformanceSnapshot>,
}

impl FakeReporting {
    pub fn with_snapshot(snapshot: PerformanceSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }
}

#[async_trait]
impl ReportingSource for FakeReporting {
    async fn snapshot(&self, _date_range: Option<&str>) -> Result<PerformanceSnapshot, GatewayError> {
        self.snapshot
            .clone()
            .ok_or_else(|| GatewayError::Unconfigured("missing REPORTING_BASE_URL".into()))
    }
}

/// Handles kept by a test alongside the suppressor built from them.
pub struct Harness {
    pub suppressor: Suppressor,
    pub gateway: Arc<FakeGateway>,
    pub ledger: Arc<InMemoryLedger>,
    pub mappings: Arc<InMemoryMappingStore>,
    pub events: Arc<EventBus>,
}

pub fn harness(gateway: FakeGateway) -> Harness {
    harness_with(gateway, FakeReporting::default(), InMemoryLedger::new())
}

pub fn harness_with(
    gateway: FakeGateway,
    reporting: FakeReporting,
    ledger: InMemoryLedger,
) -> Harness {
    let gateway = Arc::new(gateway);
    let ledger = Arc::new(ledger);
    let mappings = Arc::new(InMemoryMappingStore::new());
    let events = Arc::new(EventBus::default());
    let suppressor = Suppressor {
        ledger: ledger.clone(),
        mappings: mappings.clone() as Arc<dyn MappingStore>,
        gateway: gateway.clone(),
        reporting: Arc::new(reporting),
        events: events.clone(),
        settings: SuppressionSettings {
            concurrency: 2,
            call_timeout: Duration::from_millis(200),
        },
    };
    Harness {
        suppressor,
        gateway,
        ledger,
        mappings,
        events,
    }
}
