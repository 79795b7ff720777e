//! Interpretation of raw provider responses.
//!
//! Kept free of I/O so every response shape the ad network has produced can
//! be tested without a server.

use serde_json::Value;
use zoneguard_core::campaign_identity::ProviderCampaign;
use zoneguard_core::gateway::{snippet, ExcludedZones, GatewayError, RemovalAck};
use zoneguard_core::zone_extraction::{extract_zone_ids, normalize_zone_id, ZoneIdSet};

/// Wrapper fields that may hold the campaign listing.
const LISTING_FIELDS: &[&str] = &["campaigns", "data", "items", "result"];

/// Map a reqwest failure that happened before a response was read.
pub fn transport_error(err: &reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        message: err.to_string(),
        timed_out: err.is_timeout(),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn ensure_success(status: u16, body: &str) -> Result<(), GatewayError> {
    if is_success(status) {
        Ok(())
    } else {
        Err(GatewayError::Status {
            status,
            body: snippet(body),
        })
    }
}

fn parse_json(status: u16, body: &str) -> Result<Value, GatewayError> {
    serde_json::from_str(body).map_err(|_| GatewayError::Malformed {
        status,
        body: snippet(body),
    })
}

/// Interpret the excluded-zones resource.
///
/// A 2xx with an empty body means no exclusions. A JSON body in which no
/// extraction strategy finds a zone list is malformed.
pub fn interpret_zones(
    status: u16,
    body: &str,
    json_path: Option<&str>,
) -> Result<ExcludedZones, GatewayError> {
    ensure_success(status, body)?;
    if body.trim().is_empty() {
        return Ok(ExcludedZones {
            zones: ZoneIdSet::new(),
            status,
            strategy: None,
        });
    }

    let payload = parse_json(status, body)?;
    let extraction = extract_zone_ids(&payload, json_path);
    match extraction.strategy {
        Some(strategy) => Ok(ExcludedZones {
            zones: extraction.zones,
            status,
            strategy: Some(strategy),
        }),
        None => Err(GatewayError::Malformed {
            status,
            body: snippet(body),
        }),
    }
}

/// Interpret the response to a removal request. Any 2xx is an acknowledgement.
pub fn interpret_removal(status: u16, body: &str) -> Result<RemovalAck, GatewayError> {
    ensure_success(status, body)?;
    Ok(RemovalAck { status })
}

/// Interpret the campaign listing.
///
/// Accepts a bare array or an object wrapping one under a conventional
/// field. Entries without a usable id are dropped; a missing name becomes an
/// empty string.
pub fn interpret_campaigns(status: u16, body: &str) -> Result<Vec<ProviderCampaign>, GatewayError> {
    ensure_success(status, body)?;
    let payload = parse_json(status, body)?;

    let entries = match &payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => LISTING_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_array)),
        _ => None,
    };
    let Some(entries) = entries else {
        return Err(GatewayError::Malformed {
            status,
            body: snippet(body),
        });
    };

    Ok(entries.iter().filter_map(campaign_from_value).collect())
}

fn campaign_from_value(value: &Value) -> Option<ProviderCampaign> {
    let map = value.as_object()?;
    let id = ["id", "campaignId", "campaign_id"]
        .iter()
        .find_map(|key| map.get(*key).and_then(normalize_zone_id))?;
    let name = ["name", "title", "campaignName"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .trim()
        .to_string();
    Some(ProviderCampaign { id, name })
}
