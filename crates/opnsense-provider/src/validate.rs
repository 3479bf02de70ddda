// ── Decode-time validation ──
//
// Configuration arrives as JSON. Serde handles shape, required fields,
// defaults and enumerated values; `Validate` handles the rest (ranges,
// lengths, address syntax, cross-field rules) on the typed model.

use std::net::IpAddr;
use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::diag::Diagnostics;

pub const INVALID_ATTRIBUTE: &str = "Invalid Attribute Configuration";

pub trait Validate {
    fn validate(&self, diags: &mut Diagnostics) {
        let _ = diags;
    }
}

/// Decode and validate a model from configuration JSON.
pub fn decode<T>(value: serde_json::Value) -> Result<T, Diagnostics>
where
    T: DeserializeOwned + Validate,
{
    let model: T = serde_json::from_value(value).map_err(|e| {
        let mut diags = Diagnostics::new();
        diags.add_error(INVALID_ATTRIBUTE, e.to_string());
        diags
    })?;

    let mut diags = Diagnostics::new();
    model.validate(&mut diags);
    if diags.has_error() { Err(diags) } else { Ok(model) }
}

// ── Checks ──────────────────────────────────────────────────────────

pub fn check_range(
    diags: &mut Diagnostics,
    attribute: &str,
    value: i64,
    range: RangeInclusive<i64>,
) {
    if !range.contains(&value) {
        diags.add_attribute_error(
            attribute,
            INVALID_ATTRIBUTE,
            format!(
                "Attribute {attribute} value must be between {} and {}, got: {value}",
                range.start(),
                range.end()
            ),
        );
    }
}

pub fn check_len(
    diags: &mut Diagnostics,
    attribute: &str,
    value: &str,
    range: RangeInclusive<usize>,
) {
    let len = value.chars().count();
    if !range.contains(&len) {
        diags.add_attribute_error(
            attribute,
            INVALID_ATTRIBUTE,
            format!(
                "Attribute {attribute} string length must be between {} and {}, got: {len}",
                range.start(),
                range.end()
            ),
        );
    }
}

/// Require at least `min` elements in a collection attribute.
pub fn check_min_items(diags: &mut Diagnostics, attribute: &str, len: usize, min: usize) {
    if len < min {
        diags.add_attribute_error(
            attribute,
            INVALID_ATTRIBUTE,
            format!("Attribute {attribute} set must contain at least {min} elements, got: {len}"),
        );
    }
}

pub fn check_cidr(diags: &mut Diagnostics, attribute: &str, value: &str) {
    if !is_cidr(value) {
        diags.add_attribute_error(
            attribute,
            INVALID_ATTRIBUTE,
            format!("Attribute {attribute} must be a network in CIDR notation, got: {value}"),
        );
    }
}

pub fn check_ip(diags: &mut Diagnostics, attribute: &str, value: &str) {
    if value.parse::<IpAddr>().is_err() {
        diags.add_attribute_error(
            attribute,
            INVALID_ATTRIBUTE,
            format!("Attribute {attribute} must be an IP address, got: {value}"),
        );
    }
}

pub fn check_ip_or_cidr(diags: &mut Diagnostics, attribute: &str, value: &str) {
    if value.parse::<IpAddr>().is_err() && !is_cidr(value) {
        diags.add_attribute_error(
            attribute,
            INVALID_ATTRIBUTE,
            format!("Attribute {attribute} must be an IP address or a CIDR, got: {value}"),
        );
    }
}

/// Empty values pass; callers check presence separately.
pub fn check_uuid_v4(diags: &mut Diagnostics, attribute: &str, value: &str) {
    if value.is_empty() || is_uuid_v4(value) {
        return;
    }
    diags.add_attribute_error(
        attribute,
        INVALID_ATTRIBUTE,
        format!("Attribute {attribute} must be a valid UUIDv4, got: {value}"),
    );
}

pub fn check_one_of(diags: &mut Diagnostics, attribute: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        diags.add_attribute_error(
            attribute,
            INVALID_ATTRIBUTE,
            format!("Attribute {attribute} value must be one of the allowed values, got: \"{value}\""),
        );
    }
}

/// Port number, range (`80-443`) or well-known service name (`http`).
/// `allow_alias` also admits alias names (word characters, up to 32).
pub fn check_port(diags: &mut Diagnostics, attribute: &str, value: &str, allow_alias: bool) {
    let numeric = value.chars().all(|c| c.is_ascii_digit() || c == '-');
    let named = if allow_alias {
        value.chars().count() <= 32 && value.chars().all(|c| c.is_alphanumeric() || c == '_')
    } else {
        value.chars().all(|c| c.is_ascii_lowercase())
    };
    if !(numeric || named) {
        diags.add_attribute_error(
            attribute,
            INVALID_ATTRIBUTE,
            format!(
                "Attribute {attribute} must be number (80), range (80-443) or well known name (http), got: {value}"
            ),
        );
    }
}

pub fn is_cidr(value: &str) -> bool {
    let Some((addr, prefix)) = value.split_once('/') else {
        return false;
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match addr {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}

pub fn is_uuid_v4(value: &str) -> bool {
    Uuid::parse_str(value).is_ok_and(|u| u.get_version_num() == 4)
}
