// `opnsense_interface` and `opnsense_interface_all`: read-only views of
// the appliance's live interface configuration.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use opnsense_api::Client;
use opnsense_api::diagnostics::{InterfaceConfig, Ipv4Address, Ipv6Address};

use crate::convert::wire_to_set;
use crate::diag::Diagnostics;
use crate::handler::{DataSource, Outcome};
use crate::validate::{self, INVALID_ATTRIBUTE, Validate};

// ── Models ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub device: String,
    pub media: String,
    pub media_raw: String,
    pub macaddr: String,
    pub is_physical: bool,
    pub mtu: Option<i64>,
    pub status: String,
    pub flags: BTreeSet<String>,
    pub capabilities: BTreeSet<String>,
    pub options: BTreeSet<String>,
    pub supported_media: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub ipv4: Vec<Ipv4>,
    pub ipv6: Vec<Ipv6>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4 {
    pub ipaddr: String,
    pub subnetbits: i64,
    pub tunnel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6 {
    pub ipaddr: String,
    pub subnetbits: i64,
    pub tunnel: bool,
    pub autoconf: bool,
    pub deprecated: bool,
    pub link_local: bool,
    pub tentative: bool,
}

impl From<Ipv4Address> for Ipv4 {
    fn from(addr: Ipv4Address) -> Self {
        Self {
            ipaddr: addr.ipaddr,
            subnetbits: addr.subnetbits,
            tunnel: addr.tunnel,
        }
    }
}

impl From<Ipv6Address> for Ipv6 {
    fn from(addr: Ipv6Address) -> Self {
        Self {
            ipaddr: addr.ipaddr,
            subnetbits: addr.subnetbits,
            tunnel: addr.tunnel,
            autoconf: addr.autoconf,
            deprecated: addr.deprecated,
            link_local: addr.link_local,
            tentative: addr.tentative,
        }
    }
}

impl From<InterfaceConfig> for Interface {
    fn from(config: InterfaceConfig) -> Self {
        Self {
            device: config.device,
            media: config.media,
            media_raw: config.media_raw,
            macaddr: config.macaddr,
            is_physical: config.is_physical,
            mtu: config.mtu.trim().parse().ok(),
            status: config.status,
            flags: wire_to_set(config.flags),
            capabilities: wire_to_set(config.capabilities),
            options: wire_to_set(config.options),
            supported_media: wire_to_set(config.supported_media),
            groups: wire_to_set(config.groups),
            ipv4: config.ipv4.into_iter().map(Ipv4::from).collect(),
            ipv6: config.ipv6.into_iter().map(Ipv6::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeviceConfig {
    device: String,
}

impl Validate for DeviceConfig {
    fn validate(&self, diags: &mut Diagnostics) {
        if self.device.is_empty() {
            diags.add_attribute_error("device", INVALID_ATTRIBUTE, "Attribute device must not be empty");
        }
    }
}

// ── Data sources ────────────────────────────────────────────────────

pub struct InterfaceDataSource;

#[async_trait]
impl DataSource for InterfaceDataSource {
    fn type_name(&self) -> &'static str {
        "interface"
    }

    fn description(&self) -> &'static str {
        "Interfaces can be used to get configurations of OPNsense interfaces."
    }

    fn validate(&self, config: Value) -> Diagnostics {
        validate::decode::<DeviceConfig>(config).err().unwrap_or_default()
    }

    async fn read(&self, client: &Client, config: Value) -> Outcome {
        let config: DeviceConfig = match validate::decode(config) {
            Ok(config) => config,
            Err(diags) => return diags.into(),
        };

        match client.diagnostics().get_interface(&config.device).await {
            Ok(found) => Outcome::with_state(&Interface::from(found), Diagnostics::new()),
            Err(err) => {
                let mut diags = Diagnostics::new();
                diags.add_client_error("read", "interface", &err);
                diags.into()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct InterfaceList {
    interfaces: Vec<Interface>,
}

pub struct InterfaceAllDataSource;

#[async_trait]
impl DataSource for InterfaceAllDataSource {
    fn type_name(&self) -> &'static str {
        "interface_all"
    }

    fn description(&self) -> &'static str {
        "InterfacesAll can be used to get a list of all configurations of OPNsense interfaces. Allows for custom filtering."
    }

    fn validate(&self, _config: Value) -> Diagnostics {
        Diagnostics::new()
    }

    async fn read(&self, client: &Client, _config: Value) -> Outcome {
        match client.diagnostics().get_interface_all().await {
            Ok(all) => {
                debug!(count = all.len(), "read interface configs");
                // BTreeMap iteration keeps devices sorted by name.
                let list = InterfaceList {
                    interfaces: all.into_values().map(Interface::from).collect(),
                };
                Outcome::with_state(&list, Diagnostics::new())
            }
            Err(err) => {
                let mut diags = Diagnostics::new();
                diags.add_client_error("read", "interfaces", &err);
                diags.into()
            }
        }
    }
}
