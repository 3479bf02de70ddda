//! Serde helpers for the OPNsense wire format.
//!
//! Dropdown fields come back from `get*` endpoints as option maps:
//!
//! ```json
//! "gateway": {
//!     "WAN_DHCP": { "value": "WAN_DHCP - 10.0.0.1", "selected": 1 },
//!     "Null4":    { "value": "Null4 - 127.0.0.1",   "selected": 0 }
//! }
//! ```
//!
//! but are written back as plain strings (`"WAN_DHCP"`), or as a joined
//! string for multi-choice fields. [`SelectedMap`] and [`SelectedMapList`]
//! decode the map form and encode the string form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Selection flag ───────────────────────────────────────────────────

/// The `selected` marker shows up as `0`/`1`, `true`/`false`, or `"1"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FlagRepr {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i == 1,
            Self::Str(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    selected: Option<FlagRepr>,
}

impl Choice {
    fn is_selected(&self) -> bool {
        self.selected.as_ref().is_some_and(FlagRepr::is_set)
    }
}

/// Everything a dropdown field has been observed to decode from. PHP
/// encodes an empty option map as `[]`, hence the sequence arm.
#[derive(Deserialize)]
#[serde(untagged)]
enum SelectedRepr {
    Map(BTreeMap<String, Choice>),
    Plain(String),
    Seq(Vec<String>),
}

fn selected_keys(map: BTreeMap<String, Choice>) -> impl Iterator<Item = String> {
    map.into_iter()
        .filter(|(_, choice)| choice.is_selected())
        .map(|(key, _)| key)
}

// ── SelectedMap ──────────────────────────────────────────────────────

/// Single-choice dropdown value: the selected key, or `""` for none.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectedMap(String);

impl SelectedMap {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for SelectedMap {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SelectedMap {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for SelectedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SelectedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SelectedMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match Option::<SelectedRepr>::deserialize(deserializer)? {
            Some(SelectedRepr::Map(map)) => selected_keys(map).next().unwrap_or_default(),
            Some(SelectedRepr::Plain(s)) => s,
            Some(SelectedRepr::Seq(items)) => items.into_iter().next().unwrap_or_default(),
            None => String::new(),
        };
        Ok(Self(value))
    }
}

// ── SelectedMapList ──────────────────────────────────────────────────

/// Multi-choice dropdown value: every selected key, in key order.
///
/// Written back as a single string joined by `SEP`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SelectedMapList<const SEP: char = ','>(Vec<String>);

/// Newline-joined variant, used by alias content.
pub type SelectedMapListNl = SelectedMapList<'\n'>;

impl<const SEP: char> SelectedMapList<SEP> {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<const SEP: char> From<Vec<String>> for SelectedMapList<SEP> {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

impl<const SEP: char> FromIterator<String> for SelectedMapList<SEP> {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const SEP: char> Serialize for SelectedMapList<SEP> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut joined = String::new();
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                joined.push(SEP);
            }
            joined.push_str(item);
        }
        serializer.serialize_str(&joined)
    }
}

impl<'de, const SEP: char> Deserialize<'de> for SelectedMapList<SEP> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = match Option::<SelectedRepr>::deserialize(deserializer)? {
            Some(SelectedRepr::Map(map)) => selected_keys(map).collect(),
            Some(SelectedRepr::Plain(s)) if s.is_empty() => Vec::new(),
            Some(SelectedRepr::Plain(s)) => s.split(SEP).map(str::to_owned).collect(),
            Some(SelectedRepr::Seq(items)) => items,
            None => Vec::new(),
        };
        Ok(Self(items))
    }
}

// ── Loose scalars ────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarRepr {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Decode a string field that some endpoints emit as a number.
pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<ScalarRepr>::deserialize(deserializer)? {
        Some(ScalarRepr::Str(s)) => s,
        Some(ScalarRepr::Int(i)) => i.to_string(),
        Some(ScalarRepr::Float(f)) => f.to_string(),
        Some(ScalarRepr::Bool(b)) => if b { "1" } else { "0" }.to_owned(),
        None => String::new(),
    })
}

/// Decode a boolean field that some endpoints emit as `"1"`/`1`.
pub fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<FlagRepr>::deserialize(deserializer)?
        .as_ref()
        .is_some_and(FlagRepr::is_set))
}

/// Decode an integer field that some endpoints emit as a string.
/// Unparseable values decode as `0`.
pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Option::<ScalarRepr>::deserialize(deserializer)? {
        Some(ScalarRepr::Int(i)) => i,
        Some(ScalarRepr::Str(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn selected_map_picks_selected_key() {
        let raw = json!({
            "WAN_DHCP": { "value": "WAN_DHCP - 10.0.0.1", "selected": 1 },
            "Null4": { "value": "Null4 - 127.0.0.1", "selected": 0 }
        });
        let sm: SelectedMap = serde_json::from_value(raw).unwrap();
        assert_eq!(sm.as_str(), "WAN_DHCP");
    }

    #[test]
    fn selected_map_accepts_bool_flags() {
        let raw = json!({
            "in": { "value": "In", "selected": false },
            "out": { "value": "Out", "selected": true }
        });
        let sm: SelectedMap = serde_json::from_value(raw).unwrap();
        assert_eq!(sm.as_str(), "out");
    }

    #[test]
    fn selected_map_without_selection_is_empty() {
        let raw = json!({ "a": { "value": "A", "selected": 0 } });
        let sm: SelectedMap = serde_json::from_value(raw).unwrap();
        assert!(sm.is_empty());

        let sm: SelectedMap = serde_json::from_value(json!([])).unwrap();
        assert!(sm.is_empty());

        let sm: SelectedMap = serde_json::from_value(json!(null)).unwrap();
        assert!(sm.is_empty());
    }

    #[test]
    fn selected_map_serializes_plain() {
        let sm = SelectedMap::from("opt1");
        assert_eq!(serde_json::to_value(&sm).unwrap(), json!("opt1"));
    }

    #[test]
    fn selected_list_collects_in_key_order() {
        let raw = json!({
            "opt2": { "value": "LAN2", "selected": 1 },
            "lan": { "value": "LAN", "selected": 1 },
            "wan": { "value": "WAN", "selected": 0 }
        });
        let list: SelectedMapList = serde_json::from_value(raw).unwrap();
        assert_eq!(list.as_slice(), ["lan", "opt2"]);
    }

    #[test]
    fn selected_list_serializes_joined() {
        let list = SelectedMapList::<','>::from(vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(serde_json::to_value(&list).unwrap(), json!("a,b"));

        let content = SelectedMapListNl::from(vec!["10.0.0.0/8".to_owned(), "host".to_owned()]);
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!("10.0.0.0/8\nhost")
        );
    }

    #[test]
    fn selected_list_from_plain_string() {
        let list: SelectedMapList = serde_json::from_value(json!("lan,wan")).unwrap();
        assert_eq!(list.as_slice(), ["lan", "wan"]);

        let list: SelectedMapList = serde_json::from_value(json!("")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn selected_list_keeps_stray_empty_key() {
        let raw = json!({
            "": { "value": "", "selected": 1 },
            "10.0.0.0/8": { "value": "10.0.0.0/8", "selected": 1 }
        });
        let list: SelectedMapListNl = serde_json::from_value(raw).unwrap();
        assert_eq!(list.as_slice(), ["", "10.0.0.0/8"]);
    }

    #[derive(Deserialize)]
    struct Loose {
        #[serde(deserialize_with = "lenient_string")]
        mtu: String,
        #[serde(deserialize_with = "lenient_bool")]
        physical: bool,
        #[serde(deserialize_with = "lenient_i64")]
        bits: i64,
    }

    #[test]
    fn lenient_scalars() {
        let loose: Loose =
            serde_json::from_value(json!({ "mtu": 1500, "physical": "1", "bits": "24" })).unwrap();
        assert_eq!(loose.mtu, "1500");
        assert!(loose.physical);
        assert_eq!(loose.bits, 24);
    }
}
