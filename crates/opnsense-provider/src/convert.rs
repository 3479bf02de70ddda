// ── Wire encoding helpers ──
//
// The appliance speaks strings: booleans are "1"/"0", integers are
// decimal text, unset numbers are "" (or "-1" on read), and multi-value
// fields are separator-joined lists. Models use real types and `Option`
// for "not configured". Every converter is built from these helpers.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use opnsense_api::SelectedMapList;

/// A wire value that has no representation in the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected value '{value}' for {attribute}")]
pub struct ConvertError {
    pub attribute: &'static str,
    pub value: String,
}

// ── Scalars ─────────────────────────────────────────────────────────

pub fn bool_to_wire(value: bool) -> String {
    let digit = if value { "1" } else { "0" };
    digit.to_owned()
}

pub fn wire_to_bool(value: &str) -> bool {
    value == "1"
}

pub fn int_to_wire(value: i64) -> String {
    value.to_string()
}

/// Unset integers are sent as an empty string.
pub fn opt_int_to_wire(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// `""`, `"-1"` and anything unparseable read back as unset.
pub fn wire_to_opt_int(value: &str) -> Option<i64> {
    value.trim().parse().ok().filter(|v| *v != -1)
}

/// `-1` stands for "let the appliance decide" and goes out empty.
pub fn int_or_unset_to_wire(value: i64) -> String {
    if value == -1 {
        String::new()
    } else {
        value.to_string()
    }
}

pub fn wire_to_int_or_unset(value: &str) -> i64 {
    wire_to_opt_int(value).unwrap_or(-1)
}

pub fn opt_float_to_wire(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

pub fn wire_to_opt_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && (*v - -1.0).abs() > f64::EPSILON)
}

/// Empty strings are "not configured".
pub fn string_or_none(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Parse an enumerated wire value into its model enum.
pub fn parse_enum<E: FromStr>(attribute: &'static str, value: &str) -> Result<E, ConvertError> {
    value.parse().map_err(|_| ConvertError {
        attribute,
        value: value.to_owned(),
    })
}

// ── Sets ────────────────────────────────────────────────────────────

/// Sets are already sorted and deduplicated, so the joined wire string
/// is stable across plans.
pub fn set_to_wire<const SEP: char>(set: &BTreeSet<String>) -> SelectedMapList<SEP> {
    set.iter().cloned().collect()
}

/// Collect wire entries into a set, dropping the stray `""` the
/// appliance emits for empty lists.
pub fn wire_to_set<I>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    items.into_iter().filter(|s| !s.is_empty()).collect()
}

// ── Model decode helpers ────────────────────────────────────────────

/// Optional integers in configuration may be written as `-1` to mean
/// "unset", as older configurations did.
pub fn unset_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.filter(|v| *v != -1))
}

pub fn unset_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?
        .filter(|v| (*v - -1.0).abs() > f64::EPSILON))
}

// ── Model defaults ──────────────────────────────────────────────────

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_sequence() -> i64 {
    1
}

pub(crate) fn default_unset() -> i64 {
    -1
}

pub(crate) fn default_any() -> String {
    "any".to_owned()
}

pub(crate) fn default_wan() -> String {
    "wan".to_owned()
}
