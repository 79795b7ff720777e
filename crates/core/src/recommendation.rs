//! Zone suppression recommendations.
//!
//! Pure function over a performance snapshot supplied by the reporting
//! service. Derives a target cost-per-acquisition, turns it into thresholds,
//! and flags zones that burn budget:
//!
//! - zero-conversion burner: enough visits, no conversions, cost above a
//!   share of the target CPA
//! - negative-ROI burner: converted, spent at least one target CPA, but ROI
//!   is still at or below the floor
//!
//! Nothing here touches the ledger; output is advisory.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Visits a zone needs before a zero-conversion verdict is meaningful.
pub const MIN_VISITS: f64 = 100.0;

/// Share of the target CPA a zero-conversion zone may spend before flagging.
pub const MIN_COST_SHARE_OF_CPA: f64 = 0.4;

/// Zero-conversion spend floor when no CPA can be computed.
pub const MIN_COST_FALLBACK: f64 = 10.0;

/// ROI (percent) at or below which a converting zone is still a burner.
pub const MAX_ROI_FLOOR: f64 = -80.0;

/// Negative-ROI spend floor when no CPA can be computed.
pub const NEGATIVE_ROI_COST_FALLBACK: f64 = 50.0;

/// Multiplier turning cost-per-visit into a rough per-zone test budget.
pub const VISIT_COST_BUDGET_MULTIPLIER: f64 = 100.0;

/// Scope of every suggested rule.
pub const RULE_SCOPE_ZONE: &str = "zone";

// ---------------------------------------------------------------------------
// Snapshot (input)
// ---------------------------------------------------------------------------

/// Metric columns shared by campaign, zone and creative rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metrics {
    pub visits: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub cost: f64,
    pub roi: Option<f64>,
    pub deposits: Option<f64>,
    pub signups: Option<f64>,
}

impl Metrics {
    /// ROI in percent: the reported value, else derived from revenue and cost.
    pub fn effective_roi(&self) -> Option<f64> {
        self.roi.or_else(|| {
            (self.cost > 0.0).then(|| (self.revenue - self.cost) / self.cost * 100.0)
        })
    }

    /// True when every metric is zero or absent.
    pub fn is_inactive(&self) -> bool {
        self.visits == 0.0
            && self.conversions == 0.0
            && self.revenue == 0.0
            && self.cost == 0.0
            && self.roi.unwrap_or(0.0) == 0.0
            && self.deposits.unwrap_or(0.0) == 0.0
            && self.signups.unwrap_or(0.0) == 0.0
    }

    fn accumulate(&mut self, other: &Metrics) {
        self.visits += other.visits;
        self.conversions += other.conversions;
        self.revenue += other.revenue;
        self.cost += other.cost;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRow {
    #[serde(alias = "zoneId", alias = "zone_id", alias = "zone", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeRow {
    #[serde(alias = "creativeId", alias = "creative_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPerformance {
    #[serde(alias = "campaignId", alias = "campaign_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "traffic_source", alias = "source")]
    pub traffic_source: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(flatten)]
    pub metrics: Metrics,
    #[serde(default)]
    pub zones: Vec<ZoneRow>,
    #[serde(default)]
    pub creatives: Vec<CreativeRow>,
}

impl CampaignPerformance {
    /// Campaign-level metrics, summed from zones when the campaign row is empty.
    pub fn totals(&self) -> Metrics {
        if self.metrics.visits > 0.0 || self.metrics.cost > 0.0 {
            return self.metrics.clone();
        }
        let mut totals = self.metrics.clone();
        for zone in &self.zones {
            totals.accumulate(&zone.metrics);
        }
        totals
    }

    fn matches_traffic_source(&self, filter: &str) -> bool {
        match &self.traffic_source {
            Some(source) => source.trim().eq_ignore_ascii_case(filter),
            None => self
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&filter.to_lowercase())),
        }
    }
}

/// A reporting snapshot: campaigns with nested zone and creative rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    #[serde(default)]
    pub campaigns: Vec<CampaignPerformance>,
}

/// Accept ids the reporting service sends as either strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    crate::zone_extraction::normalize_zone_id(&value)
        .ok_or_else(|| serde::de::Error::custom("expected a non-empty string or integer id"))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Where the target CPA came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CpaSource {
    /// Cost of depositing campaigns divided by their deposits.
    Deposits,
    /// Cost per visit times [`VISIT_COST_BUDGET_MULTIPLIER`].
    VisitCost,
    /// No cost or visits to work from.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub target_cpa: Option<f64>,
    pub cpa_source: CpaSource,
    pub min_visits: f64,
    pub min_cost: f64,
    pub max_roi: f64,
    pub negative_roi_min_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFilter {
    pub traffic_source: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSuggestion {
    pub name: String,
    pub scope: String,
    pub filter: RuleFilter,
    pub condition: String,
    pub min_visits: Option<f64>,
    pub min_cost: Option<f64>,
    pub max_roi: Option<f64>,
    pub action: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateRule {
    ZeroConversion,
    NegativeRoi,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSuppressionCandidate {
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    pub zone_id: String,
    pub rule: CandidateRule,
    pub reason: String,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationMeta {
    pub traffic_source_filter: Option<String>,
    #[serde(flatten)]
    pub thresholds: Thresholds,
    pub campaigns_considered: usize,
    pub zones_considered: usize,
    pub zones_skipped_inactive: usize,
    pub candidate_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub rules: Vec<RuleSuggestion>,
    #[serde(rename = "zonesToPauseNow")]
    pub candidates: Vec<ZoneSuppressionCandidate>,
    pub meta: RecommendationMeta,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Normalise a traffic-source filter. Blank and `"all"` mean no filter.
pub fn normalize_filter(filter: Option<&str>) -> Option<String> {
    filter
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

/// Derive thresholds from the (already filtered) campaign set.
pub fn compute_thresholds(campaigns: &[&CampaignPerformance]) -> Thresholds {
    let mut total_cost = 0.0;
    let mut total_visits = 0.0;
    let mut depositing_cost = 0.0;
    let mut total_deposits = 0.0;

    for campaign in campaigns {
        let totals = campaign.totals();
        total_cost += totals.cost;
        total_visits += totals.visits;
        if let Some(deposits) = totals.deposits.filter(|d| *d > 0.0) {
            depositing_cost += totals.cost;
            total_deposits += deposits;
        }
    }

    let (target_cpa, cpa_source) = if total_deposits > 0.0 {
        (Some(depositing_cost / total_deposits), CpaSource::Deposits)
    } else if total_visits > 0.0 {
        (
            Some(total_cost / total_visits * VISIT_COST_BUDGET_MULTIPLIER),
            CpaSource::VisitCost,
        )
    } else {
        (None, CpaSource::Unavailable)
    };

    Thresholds {
        target_cpa,
        cpa_source,
        min_visits: MIN_VISITS,
        min_cost: target_cpa.map_or(MIN_COST_FALLBACK, |cpa| cpa * MIN_COST_SHARE_OF_CPA),
        max_roi: MAX_ROI_FLOOR,
        negative_roi_min_cost: target_cpa.unwrap_or(NEGATIVE_ROI_COST_FALLBACK),
    }
}

/// Decide whether one zone is a suppression candidate.
pub fn evaluate_zone(metrics: &Metrics, thresholds: &Thresholds) -> Option<(CandidateRule, String)> {
    if metrics.visits >= thresholds.min_visits
        && metrics.conversions == 0.0
        && metrics.cost >= thresholds.min_cost
    {
        return Some((
            CandidateRule::ZeroConversion,
            format!(
                "Zero-conversion burner: {:.0} visits, 0 conversions, cost {:.2} >= min cost {:.2}",
                metrics.visits, metrics.cost, thresholds.min_cost
            ),
        ));
    }

    let roi = metrics.effective_roi()?;
    if metrics.conversions > 0.0
        && metrics.cost >= thresholds.negative_roi_min_cost
        && roi <= thresholds.max_roi
    {
        return Some((
            CandidateRule::NegativeRoi,
            format!(
                "Negative-ROI burner: {:.0} conversions, cost {:.2} >= {:.2}, ROI {:.1}% <= {:.0}%",
                metrics.conversions,
                metrics.cost,
                thresholds.negative_roi_min_cost,
                roi,
                thresholds.max_roi
            ),
        ));
    }

    None
}

fn suggest_rules(thresholds: &Thresholds, filter: RuleFilter) -> Vec<RuleSuggestion> {
    let cpa_note = match (thresholds.cpa_source, thresholds.target_cpa) {
        (CpaSource::Deposits, Some(cpa)) => format!("target CPA {cpa:.2} from deposits"),
        (CpaSource::VisitCost, Some(cpa)) => {
            format!("test budget {cpa:.2} from cost per visit (no deposits reported)")
        }
        _ => "no CPA available, fixed floors applied".to_string(),
    };

    vec![
        RuleSuggestion {
            name: "Pause zero-conversion zones".to_string(),
            scope: RULE_SCOPE_ZONE.to_string(),
            filter: filter.clone(),
            condition: format!(
                "visits >= {:.0} AND conversions = 0 AND cost >= {:.2}",
                thresholds.min_visits, thresholds.min_cost
            ),
            min_visits: Some(thresholds.min_visits),
            min_cost: Some(thresholds.min_cost),
            max_roi: None,
            action: "pause_zone".to_string(),
            rationale: format!(
                "Zone has had enough traffic to convert and has spent {:.0}% of the \
                 acquisition budget without a conversion ({cpa_note}).",
                MIN_COST_SHARE_OF_CPA * 100.0
            ),
        },
        RuleSuggestion {
            name: "Pause deeply negative ROI zones".to_string(),
            scope: RULE_SCOPE_ZONE.to_string(),
            filter,
            condition: format!(
                "conversions > 0 AND cost >= {:.2} AND roi <= {:.0}",
                thresholds.negative_roi_min_cost, thresholds.max_roi
            ),
            min_visits: None,
            min_cost: Some(thresholds.negative_roi_min_cost),
            max_roi: Some(thresholds.max_roi),
            action: "pause_zone".to_string(),
            rationale: format!(
                "Zone converts but has spent a full acquisition budget while returning \
                 {:.0}% or worse ({cpa_note}).",
                thresholds.max_roi
            ),
        },
    ]
}

/// The country shared by every campaign, if there is exactly one.
fn common_country(campaigns: &[&CampaignPerformance]) -> Option<String> {
    let mut countries = campaigns.iter().map(|c| c.country.as_deref());
    let first = countries.next()??;
    countries
        .all(|c| c.is_some_and(|c| c.eq_ignore_ascii_case(first)))
        .then(|| first.to_string())
}

/// Build rule suggestions and ranked candidates for a snapshot.
pub fn recommend(snapshot: &PerformanceSnapshot, traffic_source_filter: Option<&str>) -> Recommendation {
    let filter = normalize_filter(traffic_source_filter);

    let campaigns: Vec<&CampaignPerformance> = snapshot
        .campaigns
        .iter()
        .filter(|c| filter.as_deref().is_none_or(|f| c.matches_traffic_source(f)))
        .collect();

    let thresholds = compute_thresholds(&campaigns);

    let mut candidates = Vec::new();
    let mut zones_considered = 0;
    let mut zones_skipped_inactive = 0;

    for campaign in &campaigns {
        for zone in &campaign.zones {
            if zone.metrics.is_inactive() {
                zones_skipped_inactive += 1;
                continue;
            }
            zones_considered += 1;

            if let Some((rule, reason)) = evaluate_zone(&zone.metrics, &thresholds) {
                candidates.push(ZoneSuppressionCandidate {
                    campaign_id: campaign.id.clone(),
                    campaign_name: campaign.name.clone(),
                    zone_id: zone.id.clone(),
                    rule,
                    reason,
                    metrics: zone.metrics.clone(),
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.metrics
            .cost
            .total_cmp(&a.metrics.cost)
            .then_with(|| a.campaign_id.cmp(&b.campaign_id))
            .then_with(|| a.zone_id.cmp(&b.zone_id))
    });

    let rule_filter = RuleFilter {
        traffic_source: filter.clone().unwrap_or_else(|| "all".to_string()),
        country: common_country(&campaigns),
    };

    Recommendation {
        rules: suggest_rules(&thresholds, rule_filter),
        meta: RecommendationMeta {
            traffic_source_filter: filter,
            thresholds,
            campaigns_considered: campaigns.len(),
            zones_considered,
            zones_skipped_inactive,
            candidate_count: candidates.len(),
        },
        candidates,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
