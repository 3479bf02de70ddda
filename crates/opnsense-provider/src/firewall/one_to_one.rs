// `opnsense_firewall_nat_one_to_one`: 1:1 (BINAT) NAT rules.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::firewall as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{
    ConvertError, bool_to_wire, default_any, default_sequence, default_true, default_wan,
    int_to_wire, parse_enum, set_to_wire, string_or_none, wire_to_bool, wire_to_opt_int,
    wire_to_set,
};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{Validate, check_ip_or_cidr, check_uuid_v4};

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
pub enum OneToOneType {
    #[default]
    Binat,
    Nat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NatReflection {
    /// Follow the system-wide setting; empty on the wire.
    #[default]
    Default,
    Enable,
    Disable,
}

impl NatReflection {
    fn wire_value(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    fn from_wire_value(value: &str) -> Result<Self, ConvertError> {
        match value {
            "" | "default" => Ok(Self::Default),
            "enable" => Ok(Self::Enable),
            "disable" => Ok(Self::Disable),
            other => Err(ConvertError {
                attribute: "nat_reflection",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub net: String,
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default = "default_any")]
    pub net: String,
    #[serde(default)]
    pub invert: bool,
}

impl Default for Destination {
    fn default() -> Self {
        Self {
            net: default_any(),
            invert: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatOneToOne {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub log: bool,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    #[serde(default = "default_wan")]
    pub interface: String,
    #[serde(rename = "type", default)]
    pub nat_type: OneToOneType,
    pub source: Source,
    #[serde(default)]
    pub destination: Destination,
    /// External address or subnet the traffic translates to/from.
    pub external_net: String,
    #[serde(default)]
    pub nat_reflection: NatReflection,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for NatOneToOne {
    fn validate(&self, diags: &mut Diagnostics) {
        check_ip_or_cidr(diags, "external_net", &self.external_net);
        for category in &self.categories {
            check_uuid_v4(diags, "categories", category);
        }
    }
}

pub struct NatOneToOneResource;

#[async_trait]
impl Crud for NatOneToOneResource {
    const TYPE_NAME: &'static str = "firewall_nat_one_to_one";
    const DESCRIPTION: &'static str = "1:1 NAT maps a public IP or subnet to an internal private IP or subnet. All traffic to the public address is forwarded to the internal host or network. Unlike port forwarding, it exposes the full internal system, useful for servers behind a firewall. BINAT rules enable bidirectional translation for consistent incoming and outgoing connections.";
    const KIND: &'static str = "firewall 1:1 NAT rule";

    type Model = NatOneToOne;
    type Wire = api::NatOneToOne;

    fn to_wire(model: &NatOneToOne) -> api::NatOneToOne {
        api::NatOneToOne {
            enabled: bool_to_wire(model.enabled),
            log: bool_to_wire(model.log),
            sequence: int_to_wire(model.sequence),
            interface: SelectedMap::from(model.interface.as_str()),
            nat_type: SelectedMap::from(model.nat_type.as_ref()),
            source_net: model.source.net.clone(),
            source_invert: bool_to_wire(model.source.invert),
            destination_net: model.destination.net.clone(),
            destination_invert: bool_to_wire(model.destination.invert),
            external_net: model.external_net.clone(),
            nat_reflection: SelectedMap::from(model.nat_reflection.wire_value()),
            categories: set_to_wire(&model.categories),
            description: model.description.clone().unwrap_or_default(),
        }
    }

    fn from_wire(wire: api::NatOneToOne) -> Result<NatOneToOne, ConvertError> {
        Ok(NatOneToOne {
            enabled: wire_to_bool(&wire.enabled),
            log: wire_to_bool(&wire.log),
            sequence: wire_to_opt_int(&wire.sequence).unwrap_or_else(default_sequence),
            interface: wire.interface.into_string(),
            nat_type: parse_enum("type", wire.nat_type.as_str())?,
            source: Source {
                net: wire.source_net,
                invert: wire_to_bool(&wire.source_invert),
            },
            destination: Destination {
                net: wire.destination_net,
                invert: wire_to_bool(&wire.destination_invert),
            },
            external_net: wire.external_net,
            nat_reflection: NatReflection::from_wire_value(wire.nat_reflection.as_str())?,
            categories: wire_to_set(wire.categories.into_vec()),
            description: string_or_none(wire.description),
        })
    }

    async fn add(client: &Client, wire: &api::NatOneToOne) -> Result<String, Error> {
        client.firewall().add_nat_one_to_one(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::NatOneToOne, Error> {
        client.firewall().get_nat_one_to_one(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::NatOneToOne) -> Result<(), Error> {
        client.firewall().update_nat_one_to_one(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.firewall().delete_nat_one_to_one(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::validate::decode;

    #[test]
    fn default_reflection_is_empty_on_the_wire() {
        let rule: NatOneToOne = decode(json!({
            "source": { "net": "10.0.0.5" },
            "external_net": "203.0.113.5"
        }))
        .unwrap();
        assert_eq!(rule.nat_type, OneToOneType::Binat);
        assert_eq!(rule.interface, "wan");

        let wire = NatOneToOneResource::to_wire(&rule);
        assert_eq!(wire.nat_reflection.as_str(), "");
        assert_eq!(wire.destination_net, "any");

        let back = NatOneToOneResource::from_wire(wire).unwrap();
        assert_eq!(back.nat_reflection, NatReflection::Default);
        assert_eq!(back, rule);
    }

    #[test]
    fn explicit_reflection_passes_through() {
        let wire = api::NatOneToOne {
            nat_type: SelectedMap::from("nat"),
            nat_reflection: SelectedMap::from("disable"),
            sequence: "5".into(),
            ..api::NatOneToOne::default()
        };
        let rule = NatOneToOneResource::from_wire(wire).unwrap();
        assert_eq!(rule.nat_reflection, NatReflection::Disable);
        assert_eq!(rule.nat_type, OneToOneType::Nat);
        assert_eq!(rule.sequence, 5);
    }

    #[test]
    fn external_net_must_be_address() {
        let err = decode::<NatOneToOne>(json!({
            "source": { "net": "10.0.0.5" },
            "external_net": "wan_address"
        }))
        .unwrap_err();
        assert!(err.iter().any(|d| d.attribute.as_deref() == Some("external_net")));
    }
}
