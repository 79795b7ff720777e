//! Zone id extraction from provider payloads.
//!
//! The ad network has shipped several response shapes for the excluded-zones
//! resource over time (`zone`, `zone_ids`, `zones`, `data`, nested objects,
//! arrays of objects). Extraction is an ordered list of strategies; the first
//! one that recognises a zone list wins, even when that list is empty:
//!
//! 1. [`ExtractionStrategy::JsonPath`] -- an operator-configured path
//! 2. [`ExtractionStrategy::NamedField`] -- [`CONVENTIONAL_ZONE_FIELDS`]
//! 3. [`ExtractionStrategy::DeepScan`] -- any numeric array or array of
//!    zone-shaped objects anywhere in the payload
//!
//! Every id is normalised to its canonical string form.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::campaign_identity::is_numeric_id;

/// Canonical set of zone ids. Ordered so diagnostics and tests are stable.
pub type ZoneIdSet = BTreeSet<String>;

/// Field names probed, in order, by the named-field strategy.
pub const CONVENTIONAL_ZONE_FIELDS: &[&str] = &[
    "zone",
    "zones",
    "zone_ids",
    "zoneIds",
    "excluded_zones",
    "excludedZones",
    "data",
    "items",
    "result",
];

/// Keys that identify a zone inside a zone-shaped object.
const ZONE_OBJECT_KEYS: &[&str] = &["zoneId", "zone_id", "zone", "id"];

/// How deep the named-field strategy follows nested objects.
const MAX_NAMED_FIELD_DEPTH: usize = 3;

/// Which strategy recognised the zone list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    JsonPath,
    NamedField,
    DeepScan,
}

/// Result of running the strategy list over one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneExtraction {
    pub zones: ZoneIdSet,
    /// `None` when no strategy recognised anything zone-like.
    pub strategy: Option<ExtractionStrategy>,
}

impl ZoneExtraction {
    pub fn recognised(&self) -> bool {
        self.strategy.is_some()
    }
}

/// Run all strategies in order over `payload`.
pub fn extract_zone_ids(payload: &Value, json_path: Option<&str>) -> ZoneExtraction {
    let path = json_path.map(str::trim).filter(|p| !p.is_empty());

    let attempts: [(ExtractionStrategy, Option<ZoneIdSet>); 3] = [
        (
            ExtractionStrategy::JsonPath,
            path.and_then(|p| by_json_path(payload, p)),
        ),
        (ExtractionStrategy::NamedField, by_named_field(payload)),
        (ExtractionStrategy::DeepScan, by_deep_scan(payload)),
    ];

    attempts
        .into_iter()
        .find_map(|(strategy, zones)| {
            zones.map(|zones| ZoneExtraction {
                zones,
                strategy: Some(strategy),
            })
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Canonical string form of a primitive zone id.
///
/// Integral floats lose their fraction (`123.0` -> `"123"`); blank strings,
/// booleans, nulls and containers yield `None`.
pub fn normalize_zone_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| format!("{f:.0}"))
            }
        }
        _ => None,
    }
}

/// Zone id carried by a zone-shaped object, if any.
fn zone_id_from_object(map: &serde_json::Map<String, Value>) -> Option<String> {
    ZONE_OBJECT_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(normalize_zone_id)
}

/// Interpret an array as a zone list.
///
/// Empty arrays are a valid (empty) list. A non-empty array is only a zone
/// list if at least one element normalises to an id.
fn zone_list_from_array(items: &[Value]) -> Option<ZoneIdSet> {
    let zones: ZoneIdSet = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => zone_id_from_object(map),
            other => normalize_zone_id(other),
        })
        .collect();

    (items.is_empty() || !zones.is_empty()).then_some(zones)
}

/// Split a delimited string such as `"123, 456 789"`.
fn zone_list_from_string(raw: &str) -> ZoneIdSet {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret whatever sits at a located position.
fn zone_list_from_value(value: &Value, depth: usize) -> Option<ZoneIdSet> {
    match value {
        Value::Array(items) => zone_list_from_array(items),
        Value::String(raw) => Some(zone_list_from_string(raw)),
        Value::Object(_) if depth < MAX_NAMED_FIELD_DEPTH => named_field_at(value, depth + 1),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Strategy 1: configured JSON path
// ---------------------------------------------------------------------------

/// Follow a dotted path such as `$.data.targeting[0].zones`.
pub fn lookup_path<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim().trim_start_matches('$').trim_start_matches('.');
    if path.is_empty() {
        return Some(payload);
    }

    let mut current = payload;
    for segment in path.split('.') {
        let (field, indices) = match segment.find('[') {
            Some(pos) => (&segment[..pos], &segment[pos..]),
            None => (segment, ""),
        };
        if !field.is_empty() {
            current = current.get(field)?;
        }
        for index in indices
            .split(['[', ']'])
            .filter(|part| !part.is_empty())
        {
            current = current.get(index.parse::<usize>().ok()?)?;
        }
    }
    Some(current)
}

pub fn by_json_path(payload: &Value, path: &str) -> Option<ZoneIdSet> {
    lookup_path(payload, path).and_then(|value| zone_list_from_value(value, 0))
}

// ---------------------------------------------------------------------------
// Strategy 2: conventional field names
// ---------------------------------------------------------------------------

pub fn by_named_field(payload: &Value) -> Option<ZoneIdSet> {
    match payload {
        Value::Array(items) => zone_list_from_array(items),
        _ => named_field_at(payload, 0),
    }
}

fn named_field_at(value: &Value, depth: usize) -> Option<ZoneIdSet> {
    let map = value.as_object()?;
    CONVENTIONAL_ZONE_FIELDS
        .iter()
        .filter_map(|field| map.get(*field))
        .find_map(|found| zone_list_from_value(found, depth))
}

// ---------------------------------------------------------------------------
// Strategy 3: structural deep scan
// ---------------------------------------------------------------------------

/// Find zone-like arrays anywhere in the payload.
///
/// Only numeric primitives and objects with a numeric zone key qualify.
/// Arrays under a key mentioning "zone" are preferred; otherwise the first
/// qualifying array in document order wins.
pub fn by_deep_scan(payload: &Value) -> Option<ZoneIdSet> {
    let mut found: Vec<(bool, ZoneIdSet)> = Vec::new();
    scan(payload, false, &mut found);

    let preferred = found.iter().position(|(zone_keyed, _)| *zone_keyed);
    let index = preferred.or(if found.is_empty() { None } else { Some(0) })?;
    Some(found.swap_remove(index).1)
}

fn scan(value: &Value, zone_keyed: bool, found: &mut Vec<(bool, ZoneIdSet)>) {
    match value {
        Value::Array(items) => {
            if let Some(zones) = numeric_zone_list(items) {
                found.push((zone_keyed, zones));
                return;
            }
            for item in items {
                scan(item, false, found);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                scan(child, key.to_ascii_lowercase().contains("zone"), found);
            }
        }
        _ => {}
    }
}

fn numeric_zone_list(items: &[Value]) -> Option<ZoneIdSet> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| {
            let id = match item {
                Value::Object(map) => zone_id_from_object(map),
                other => normalize_zone_id(other),
            }?;
            is_numeric_id(&id).then_some(id)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn set(ids: &[&str]) -> ZoneIdSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    // -- normalize_zone_id ----------------------------------------------------

    #[test]
    fn normalize_handles_numbers_and_strings() {
        assert_eq!(normalize_zone_id(&json!(123)), Some("123".into()));
        assert_eq!(normalize_zone_id(&json!(123.0)), Some("123".into()));
        assert_eq!(normalize_zone_id(&json!(" 456 ")), Some("456".into()));
        assert_eq!(normalize_zone_id(&json!(1.5)), None);
        assert_eq!(normalize_zone_id(&json!("")), None);
        assert_eq!(normalize_zone_id(&json!(null)), None);
        assert_eq!(normalize_zone_id(&json!(true)), None);
    }

    // -- JSON path ------------------------------------------------------------

    #[test]
    fn json_path_with_prefix_and_index() {
        let payload = json!({"data": {"targeting": [{"zones": [1, 2]}]}});
        assert_eq!(
            by_json_path(&payload, "$.data.targeting[0].zones"),
            Some(set(&["1", "2"]))
        );
    }

    #[test]
    fn json_path_missing_falls_through_to_named_field() {
        let payload = json!({"zone": ["9"]});
        let extraction = extract_zone_ids(&payload, Some("nope.zones"));
        assert_eq!(extraction.zones, set(&["9"]));
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::NamedField));
    }

    #[test]
    fn json_path_takes_precedence() {
        let payload = json!({"zone": ["1"], "custom": {"list": ["2"]}});
        let extraction = extract_zone_ids(&payload, Some("custom.list"));
        assert_eq!(extraction.zones, set(&["2"]));
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::JsonPath));
    }

    // -- Named fields ---------------------------------------------------------

    #[test]
    fn named_field_top_level_array_payload() {
        assert_eq!(by_named_field(&json!([10, "11"])), Some(set(&["10", "11"])));
    }

    #[test]
    fn named_field_follows_data_wrapper() {
        let payload = json!({"data": {"zone_ids": [{"zone_id": 5}, {"zone_id": "6"}]}});
        assert_eq!(by_named_field(&payload), Some(set(&["5", "6"])));
    }

    #[test]
    fn named_field_empty_list_is_recognised() {
        let extraction = extract_zone_ids(&json!({"zones": []}), None);
        assert!(extraction.recognised());
        assert!(extraction.zones.is_empty());
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::NamedField));
    }

    #[test]
    fn named_field_comma_separated_string() {
        assert_eq!(
            by_named_field(&json!({"zone": "100, 200 300"})),
            Some(set(&["100", "200", "300"]))
        );
    }

    #[test]
    fn named_field_skips_non_zone_arrays() {
        // `data` holds objects without zone keys, so `items` is tried next.
        let payload = json!({"data": [{"name": "x"}], "items": [7]});
        assert_eq!(by_named_field(&payload), Some(set(&["7"])));
    }

    // -- Deep scan ------------------------------------------------------------

    #[test]
    fn deep_scan_prefers_zone_keyed_arrays() {
        let payload = json!({
            "meta": {"pages": [1, 2, 3]},
            "payload": {"blockedZoneList": [{"zoneId": 42}, {"zoneId": 43}]}
        });
        assert_eq!(by_deep_scan(&payload), Some(set(&["42", "43"])));
    }

    #[test]
    fn deep_scan_falls_back_to_first_numeric_array() {
        let payload = json!({"wrapper": {"inner": {"list": ["901", "902"]}}});
        let extraction = extract_zone_ids(&payload, None);
        assert_eq!(extraction.zones, set(&["901", "902"]));
        assert_eq!(extraction.strategy, Some(ExtractionStrategy::DeepScan));
    }

    #[test]
    fn deep_scan_ignores_non_numeric_arrays() {
        let payload = json!({"wrapper": {"countries": ["US", "DE"]}});
        assert_eq!(by_deep_scan(&payload), None);
    }

    #[test]
    fn unrecognised_payload_yields_empty_unrecognised() {
        let extraction = extract_zone_ids(&json!({"status": "ok"}), None);
        assert!(!extraction.recognised());
        assert!(extraction.zones.is_empty());
    }
}
