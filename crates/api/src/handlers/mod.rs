//! Request handlers for the suppression API.
//!
//! Handlers validate their input, hand it to the
//! [`Suppressor`](zoneguard_suppression::Suppressor) and map errors via
//! [`AppError`](crate::error::AppError).

pub mod mappings;
pub mod preview;
pub mod suppression;

use serde::{Deserialize, Deserializer};
use zoneguard_core::zone_extraction::normalize_zone_id;

/// Accept identifiers sent as either JSON strings or integers.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    normalize_zone_id(&value)
        .ok_or_else(|| serde::de::Error::custom("expected a non-empty string or integer id"))
}

/// Optional variant of [`id_string`]; `null` and a missing field are `None`.
pub(crate) fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => normalize_zone_id(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a non-empty string or integer id")),
    }
}
