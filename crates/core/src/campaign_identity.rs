//! Campaign identity resolution.
//!
//! The reporting side knows a campaign by an opaque id and a display name;
//! the ad network only knows its own numeric id. Resolution runs a fixed
//! waterfall, first match wins:
//!
//! 1. the local id is already numeric
//! 2. an `Ignored` mapping exists for the id or the name
//! 3. a `Mapped` override exists for the id or the name
//! 4. the name embeds a run of 6+ digits
//! 5. the name equals a provider campaign name
//! 6. the name and a provider campaign name contain one another (any case)
//!
//! Steps 1-4 need only the mapping table ([`resolve_local`]); steps 5-6 need
//! the provider campaign listing, which callers fetch at most once per batch
//! and only when some reference gets that far.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Wire value of a mapping that marks a campaign as "do not resolve".
pub const IGNORED_SENTINEL: &str = "ignore";

/// Minimum length of a digit run treated as an embedded provider id.
pub const MIN_EMBEDDED_ID_DIGITS: usize = 6;

/// A digit run of at least six characters flanked by non-digits.
static EMBEDDED_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{6,})(?:[^0-9]|$)").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A campaign as the reporting side knows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl CampaignRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The display name when present, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A campaign as the ad network lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCampaign {
    pub id: String,
    pub name: String,
}

/// The stored value of a manual mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "providerId", rename_all = "snake_case")]
pub enum MappingTarget {
    /// Resolve to this provider campaign id.
    Mapped(String),
    /// Never attempt resolution for this campaign.
    Ignored,
}

impl MappingTarget {
    /// Parse the wire representation used by the mappings API.
    ///
    /// [`IGNORED_SENTINEL`] (any case) becomes [`MappingTarget::Ignored`];
    /// any other non-blank value is a provider id.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(CoreError::Validation(
                "Provider id must not be empty".to_string(),
            ));
        }
        if value.eq_ignore_ascii_case(IGNORED_SENTINEL) {
            return Ok(Self::Ignored);
        }
        Ok(Self::Mapped(value.to_string()))
    }

    /// The wire representation (inverse of [`MappingTarget::parse`]).
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Mapped(id) => id,
            Self::Ignored => IGNORED_SENTINEL,
        }
    }
}

/// Result of consulting the mapping table for one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingLookup<'a> {
    Mapped(&'a str),
    Ignored,
    Unmapped,
}

/// In-memory view of the manual override table, keyed by local id or name.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, MappingTarget>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, target: MappingTarget) {
        self.entries.insert(key.into().trim().to_string(), target);
    }

    pub fn get(&self, key: &str) -> Option<&MappingTarget> {
        self.entries.get(key.trim())
    }

    /// Look a campaign up by id and by name.
    ///
    /// An `Ignored` entry under either key wins over any `Mapped` entry; among
    /// `Mapped` entries the id key wins over the name key.
    pub fn classify(&self, campaign: &CampaignRef) -> MappingLookup<'_> {
        let hits: Vec<&MappingTarget> = [Some(campaign.id.as_str()), campaign.name.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(|key| self.get(key))
            .collect();

        if hits.iter().any(|t| matches!(t, MappingTarget::Ignored)) {
            return MappingLookup::Ignored;
        }

        hits.into_iter()
            .find_map(|t| match t {
                MappingTarget::Mapped(id) => Some(MappingLookup::Mapped(id.as_str())),
                MappingTarget::Ignored => None,
            })
            .unwrap_or(MappingLookup::Unmapped)
    }
}

impl<K: Into<String>> FromIterator<(K, MappingTarget)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (K, MappingTarget)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, target) in iter {
            table.insert(key, target);
        }
        table
    }
}

/// Which waterfall step produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    NumericId,
    Override,
    EmbeddedId,
    ExactName,
    SubstringName,
}

/// Outcome of resolving one campaign reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        provider_id: String,
        strategy: ResolutionStrategy,
    },
    /// Explicitly excluded by an `Ignored` mapping.
    Ignored,
    /// No strategy matched.
    Unresolved,
}

impl Resolution {
    fn resolved(provider_id: impl Into<String>, strategy: ResolutionStrategy) -> Self {
        Self::Resolved {
            provider_id: provider_id.into(),
            strategy,
        }
    }

    pub fn provider_id(&self) -> Option<&str> {
        match self {
            Self::Resolved { provider_id, .. } => Some(provider_id),
            Self::Ignored | Self::Unresolved => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// True when `id` is a non-empty string of ASCII digits.
pub fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Extract the first run of [`MIN_EMBEDDED_ID_DIGITS`]+ digits from `name`.
pub fn extract_embedded_id(name: &str) -> Option<String> {
    EMBEDDED_ID_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Strength of a name match. Ordered: `Exact > Substring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameMatch {
    Substring,
    Exact,
}

impl NameMatch {
    pub fn strategy(self) -> ResolutionStrategy {
        match self {
            Self::Exact => ResolutionStrategy::ExactName,
            Self::Substring => ResolutionStrategy::SubstringName,
        }
    }
}

/// Score a local campaign name against one provider campaign name.
///
/// Blank names never match: an empty string is contained in everything.
pub fn name_match_score(local: &str, provider: &str) -> Option<NameMatch> {
    let local = local.trim();
    let provider = provider.trim();
    if local.is_empty() || provider.is_empty() {
        return None;
    }
    if local == provider {
        return Some(NameMatch::Exact);
    }

    let local = local.to_lowercase();
    let provider = provider.to_lowercase();
    if local.contains(&provider) || provider.contains(&local) {
        Some(NameMatch::Substring)
    } else {
        None
    }
}

/// Pick the best-scoring provider campaign for `name`.
///
/// Ties go to the campaign listed first.
pub fn best_name_match<'a>(
    name: &str,
    listing: &'a [ProviderCampaign],
) -> Option<(&'a ProviderCampaign, NameMatch)> {
    let mut best: Option<(&ProviderCampaign, NameMatch)> = None;
    for campaign in listing {
        if let Some(score) = name_match_score(name, &campaign.name) {
            if best.is_none_or(|(_, current)| score > current) {
                best = Some((campaign, score));
            }
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Waterfall
// ---------------------------------------------------------------------------

/// Run steps 1-4 of the waterfall.
///
/// Returns `None` when the reference needs the provider listing (steps 5-6).
pub fn resolve_local(campaign: &CampaignRef, mappings: &MappingTable) -> Option<Resolution> {
    let id = campaign.id.trim();
    if is_numeric_id(id) {
        return Some(Resolution::resolved(id, ResolutionStrategy::NumericId));
    }

    match mappings.classify(campaign) {
        MappingLookup::Ignored => return Some(Resolution::Ignored),
        MappingLookup::Mapped(provider_id) => {
            return Some(Resolution::resolved(
                provider_id,
                ResolutionStrategy::Override,
            ))
        }
        MappingLookup::Unmapped => {}
    }

    campaign
        .name
        .as_deref()
        .and_then(extract_embedded_id)
        .map(|id| Resolution::resolved(id, ResolutionStrategy::EmbeddedId))
}

/// Run the full waterfall against a provider listing.
pub fn resolve(
    campaign: &CampaignRef,
    mappings: &MappingTable,
    listing: &[ProviderCampaign],
) -> Resolution {
    if let Some(resolution) = resolve_local(campaign, mappings) {
        return resolution;
    }

    campaign
        .name
        .as_deref()
        .and_then(|name| best_name_match(name, listing))
        .map(|(matched, score)| Resolution::resolved(matched.id.clone(), score.strategy()))
        .unwrap_or(Resolution::Unresolved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn listing() -> Vec<ProviderCampaign> {
        vec![
            ProviderCampaign {
                id: "7001".into(),
                name: "Casino DE Push".into(),
            },
            ProviderCampaign {
                id: "7002".into(),
                name: "Sweeps US".into(),
            },
            ProviderCampaign {
                id: "7003".into(),
                name: "sweeps us".into(),
            },
        ]
    }

    // -- MappingTarget --------------------------------------------------------

    #[test]
    fn mapping_target_parses_sentinel_any_case() {
        assert_eq!(MappingTarget::parse("IGNORE").unwrap(), MappingTarget::Ignored);
        assert_eq!(MappingTarget::parse(" ignore ").unwrap(), MappingTarget::Ignored);
    }

    #[test]
    fn mapping_target_parses_provider_id() {
        assert_eq!(
            MappingTarget::parse(" 12345 ").unwrap(),
            MappingTarget::Mapped("12345".into())
        );
    }

    #[test]
    fn mapping_target_rejects_blank() {
        assert_matches!(MappingTarget::parse("   "), Err(CoreError::Validation(_)));
    }

    // -- Step 1: numeric id ---------------------------------------------------

    #[test]
    fn numeric_id_short_circuits_everything() {
        let mut mappings = MappingTable::new();
        mappings.insert("555", MappingTarget::Ignored);
        mappings.insert("Promo 9999999", MappingTarget::Mapped("1".into()));
        let campaign = CampaignRef::new("555").with_name("Promo 9999999");

        let resolution = resolve(&campaign, &mappings, &listing());
        assert_eq!(
            resolution,
            Resolution::Resolved {
                provider_id: "555".into(),
                strategy: ResolutionStrategy::NumericId,
            }
        );
    }

    // -- Steps 2 and 3: mapping table -----------------------------------------

    #[test]
    fn ignored_by_name_wins_over_override_by_id() {
        let mut mappings = MappingTable::new();
        mappings.insert("cmp-a", MappingTarget::Mapped("42".into()));
        mappings.insert("Brand A", MappingTarget::Ignored);
        let campaign = CampaignRef::new("cmp-a").with_name("Brand A");

        assert_eq!(resolve(&campaign, &mappings, &listing()), Resolution::Ignored);
    }

    #[test]
    fn override_by_name_beats_embedded_digits() {
        let mappings: MappingTable =
            [("Promo 1234567", MappingTarget::Mapped("42".into()))].into_iter().collect();
        let campaign = CampaignRef::new("cmp-a").with_name("Promo 1234567");

        assert_eq!(
            resolve_local(&campaign, &mappings),
            Some(Resolution::Resolved {
                provider_id: "42".into(),
                strategy: ResolutionStrategy::Override,
            })
        );
    }

    #[test]
    fn override_by_id_preferred_over_override_by_name() {
        let mappings: MappingTable = [
            ("Brand A", MappingTarget::Mapped("2".into())),
            ("cmp-a", MappingTarget::Mapped("1".into())),
        ]
        .into_iter()
        .collect();
        let campaign = CampaignRef::new("cmp-a").with_name("Brand A");

        assert_eq!(mappings.classify(&campaign), MappingLookup::Mapped("1"));
    }

    // -- Step 4: embedded digits ----------------------------------------------

    #[test]
    fn embedded_id_requires_six_digits() {
        assert_eq!(extract_embedded_id("DE push 12345"), None);
        assert_eq!(extract_embedded_id("DE push 123456"), Some("123456".into()));
    }

    #[test]
    fn embedded_id_takes_whole_run_with_boundaries() {
        assert_eq!(
            extract_embedded_id("[8812345678]-casino_v2"),
            Some("8812345678".into())
        );
        assert_eq!(extract_embedded_id("9876543"), Some("9876543".into()));
    }

    #[test]
    fn embedded_id_picks_first_run() {
        assert_eq!(
            extract_embedded_id("a 111111 b 222222"),
            Some("111111".into())
        );
    }

    #[test]
    fn embedded_id_resolves_without_listing() {
        let campaign = CampaignRef::new("uuid-abc").with_name("Sweeps US 4455667");
        assert_eq!(
            resolve_local(&campaign, &MappingTable::new()),
            Some(Resolution::Resolved {
                provider_id: "4455667".into(),
                strategy: ResolutionStrategy::EmbeddedId,
            })
        );
    }

    // -- Steps 5 and 6: name scoring ------------------------------------------

    #[test]
    fn score_exact_match() {
        assert_eq!(name_match_score("Sweeps US", "Sweeps US"), Some(NameMatch::Exact));
    }

    #[test]
    fn score_substring_either_direction_ignores_case() {
        assert_eq!(
            name_match_score("sweeps us - week 3", "Sweeps US"),
            Some(NameMatch::Substring)
        );
        assert_eq!(name_match_score("casino", "Casino DE Push"), Some(NameMatch::Substring));
    }

    #[test]
    fn score_blank_names_never_match() {
        assert_eq!(name_match_score("", "Sweeps US"), None);
        assert_eq!(name_match_score("Sweeps US", "  "), None);
    }

    #[test]
    fn score_unrelated_names_do_not_match() {
        assert_eq!(name_match_score("Dating FR", "Sweeps US"), None);
    }

    #[test]
    fn exact_match_beats_earlier_substring_match() {
        // "sweeps us" (7003) is an exact match; "Sweeps US" (7002) is listed
        // first but only matches case-insensitively.
        let campaign = CampaignRef::new("local-1").with_name("sweeps us");
        assert_eq!(
            resolve(&campaign, &MappingTable::new(), &listing()),
            Resolution::Resolved {
                provider_id: "7003".into(),
                strategy: ResolutionStrategy::ExactName,
            }
        );
    }

    #[test]
    fn substring_ties_go_to_first_listed() {
        let campaign = CampaignRef::new("local-1").with_name("SWEEPS");
        let listing = listing();
        let (matched, score) = best_name_match("SWEEPS", &listing).unwrap();
        assert_eq!(matched.id, "7002");
        assert_eq!(score, NameMatch::Substring);
        assert_eq!(
            resolve(&campaign, &MappingTable::new(), &listing).provider_id(),
            Some("7002")
        );
    }

    // -- Step 7 ---------------------------------------------------------------

    #[test]
    fn unmatched_name_is_unresolved() {
        let campaign = CampaignRef::new("local-1").with_name("Dating FR");
        assert_eq!(
            resolve(&campaign, &MappingTable::new(), &listing()),
            Resolution::Unresolved
        );
    }

    #[test]
    fn nameless_non_numeric_reference_is_unresolved() {
        let campaign = CampaignRef::new("local-1");
        assert_eq!(resolve_local(&campaign, &MappingTable::new()), None);
        assert_eq!(
            resolve(&campaign, &MappingTable::new(), &listing()),
            Resolution::Unresolved
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let campaign = CampaignRef::new("local-1").with_name("Casino");
        let first = resolve(&campaign, &MappingTable::new(), &listing());
        for _ in 0..10 {
            assert_eq!(resolve(&campaign, &MappingTable::new(), &listing()), first);
        }
    }
}
