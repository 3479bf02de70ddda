// `opnsense_firewall_nat`: outbound (source) NAT rules.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::firewall as api;
use opnsense_api::{Client, Error, SelectedMap};

use super::Location;
use crate::convert::{
    ConvertError, bool_to_wire, default_sequence, default_true, int_to_wire, parse_enum,
    string_or_none, wire_to_bool, wire_to_opt_int,
};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{INVALID_ATTRIBUTE, Validate, check_len, check_port};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NatIpProtocol {
    #[default]
    Inet,
    Inet6,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Address or alias packets are translated to (`<int>ip` for an
    /// interface address).
    pub ip: String,
    #[serde(default)]
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nat {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub disable_nat: bool,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    pub interface: String,
    #[serde(default)]
    pub ip_protocol: NatIpProtocol,
    pub protocol: String,
    #[serde(default)]
    pub source: Location,
    #[serde(default)]
    pub destination: Location,
    pub target: Target,
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for Nat {
    fn validate(&self, diags: &mut Diagnostics) {
        check_port(diags, "source.port", &self.source.port, false);
        check_port(diags, "destination.port", &self.destination.port, false);
        check_port(diags, "target.port", &self.target.port, true);
        if let Some(description) = &self.description {
            check_len(diags, "description", description, 1..=255);
            if !description.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '.') {
                diags.add_attribute_error(
                    "description",
                    INVALID_ATTRIBUTE,
                    "Attribute description must only contain alphanumeric characters, spaces or `.`",
                );
            }
        }
    }
}

pub struct NatResource;

#[async_trait]
impl Crud for NatResource {
    const TYPE_NAME: &'static str = "firewall_nat";
    const DESCRIPTION: &'static str = "Network Address Translation (abbreviated to NAT) is a way to separate external and internal networks (WANs and LANs), and to share an external IP between clients on the internal network.";
    const KIND: &'static str = "firewall NAT rule";

    type Model = Nat;
    type Wire = api::Nat;

    fn to_wire(model: &Nat) -> api::Nat {
        api::Nat {
            enabled: bool_to_wire(model.enabled),
            disable_nat: bool_to_wire(model.disable_nat),
            sequence: int_to_wire(model.sequence),
            interface: SelectedMap::from(model.interface.as_str()),
            ip_protocol: SelectedMap::from(model.ip_protocol.as_ref()),
            protocol: SelectedMap::from(model.protocol.as_str()),
            source_net: model.source.net.clone(),
            source_port: model.source.port.clone(),
            source_invert: bool_to_wire(model.source.invert),
            destination_net: model.destination.net.clone(),
            destination_port: model.destination.port.clone(),
            destination_invert: bool_to_wire(model.destination.invert),
            target: model.target.ip.clone(),
            target_port: model.target.port.clone(),
            log: bool_to_wire(model.log),
            description: model.description.clone().unwrap_or_default(),
        }
    }

    fn from_wire(wire: api::Nat) -> Result<Nat, ConvertError> {
        Ok(Nat {
            enabled: wire_to_bool(&wire.enabled),
            disable_nat: wire_to_bool(&wire.disable_nat),
            sequence: wire_to_opt_int(&wire.sequence).unwrap_or_else(default_sequence),
            interface: wire.interface.into_string(),
            ip_protocol: parse_enum("ip_protocol", wire.ip_protocol.as_str())?,
            protocol: wire.protocol.into_string(),
            source: Location {
                net: wire.source_net,
                port: wire.source_port,
                invert: wire_to_bool(&wire.source_invert),
            },
            destination: Location {
                net: wire.destination_net,
                port: wire.destination_port,
                invert: wire_to_bool(&wire.destination_invert),
            },
            target: Target {
                ip: wire.target,
                port: wire.target_port,
            },
            log: wire_to_bool(&wire.log),
            description: string_or_none(wire.description),
        })
    }

    async fn add(client: &Client, wire: &api::Nat) -> Result<String, Error> {
        client.firewall().add_nat(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Nat, Error> {
        client.firewall().get_nat(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Nat) -> Result<(), Error> {
        client.firewall().update_nat(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.firewall().delete_nat(id).await
    }
}
