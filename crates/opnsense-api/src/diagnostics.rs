// Diagnostics endpoints
//
// `getInterfaceConfig` returns every device in one object keyed by
// device name. Values come straight from ifconfig parsing, so field
// types drift between releases (`mtu` as string or number, flags as
// bools or "1").

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::Client;
use crate::codec::{lenient_bool, lenient_i64, lenient_string};
use crate::error::Error;

const INTERFACE_CONFIG: &str = "/diagnostics/interface/getInterfaceConfig";

// ── Interface config ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Filled in from the map key; the appliance does not repeat it.
    pub device: String,
    pub flags: Vec<String>,
    pub capabilities: Vec<String>,
    pub options: Vec<String>,
    pub macaddr: String,
    pub supported_media: Vec<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_physical: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub mtu: String,
    pub media: String,
    pub media_raw: String,
    pub status: String,
    pub groups: Vec<String>,
    pub ipv4: Vec<Ipv4Address>,
    pub ipv6: Vec<Ipv6Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipv4Address {
    pub ipaddr: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub subnetbits: i64,
    #[serde(deserialize_with = "lenient_bool")]
    pub tunnel: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipv6Address {
    pub ipaddr: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub subnetbits: i64,
    #[serde(deserialize_with = "lenient_bool")]
    pub tunnel: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub autoconf: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub deprecated: bool,
    #[serde(rename = "link-local", alias = "link_local", deserialize_with = "lenient_bool")]
    pub link_local: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub tentative: bool,
}

// ── Accessor ─────────────────────────────────────────────────────────

/// Diagnostics endpoint group, returned by [`Client::diagnostics`].
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'a> {
    client: &'a Client,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Every interface, keyed by device name.
    ///
    /// `GET /diagnostics/interface/getInterfaceConfig`
    pub async fn get_interface_all(&self) -> Result<BTreeMap<String, InterfaceConfig>, Error> {
        debug!("listing interface configs");
        let mut all: BTreeMap<String, InterfaceConfig> =
            self.client.get_json(INTERFACE_CONFIG).await?;
        for (device, config) in &mut all {
            config.device.clone_from(device);
        }
        Ok(all)
    }

    /// A single interface by device name (e.g. `vtnet0`).
    pub async fn get_interface(&self, device: &str) -> Result<InterfaceConfig, Error> {
        self.get_interface_all()
            .await?
            .remove(device)
            .ok_or_else(|| Error::NotFound {
                kind: "interface",
                id: device.to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn interface_config_tolerates_loose_types() {
        let raw = json!({
            "flags": ["up", "broadcast"],
            "is_physical": "1",
            "mtu": 1500,
            "ipv4": [{ "ipaddr": "10.0.0.1", "subnetbits": 24, "tunnel": false }],
            "ipv6": [{ "ipaddr": "fe80::1", "subnetbits": "64", "link-local": true }]
        });
        let config: InterfaceConfig = serde_json::from_value(raw).unwrap();
        assert!(config.is_physical);
        assert_eq!(config.mtu, "1500");
        assert_eq!(config.ipv4[0].subnetbits, 24);
        assert!(config.ipv6[0].link_local);
        assert_eq!(config.ipv6[0].subnetbits, 64);
        assert!(config.groups.is_empty());
    }
}
