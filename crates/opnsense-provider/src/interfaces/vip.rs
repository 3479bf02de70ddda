// `opnsense_interfaces_vip`: virtual IP addresses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::interfaces as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{ConvertError, default_wan, parse_enum, string_or_none};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{Validate, check_cidr, check_ip_or_cidr};

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
pub enum VipMode {
    #[default]
    Ipalias,
    Proxyarp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vip {
    #[serde(default)]
    pub mode: VipMode,
    #[serde(default = "default_wan")]
    pub interface: String,
    /// Address with prefix length, e.g. `192.168.1.10/24`.
    pub network: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for Vip {
    fn validate(&self, diags: &mut Diagnostics) {
        check_cidr(diags, "network", &self.network);
        if let Some(gateway) = &self.gateway {
            check_ip_or_cidr(diags, "gateway", gateway);
        }
    }
}

pub struct VipResource;

#[async_trait]
impl Crud for VipResource {
    const TYPE_NAME: &'static str = "interfaces_vip";
    const DESCRIPTION: &'static str = "Virtual IPs allow an OPNsense firewall to assign multiple IP addresses to the same network interface.";
    const KIND: &'static str = "virtual IP";

    type Model = Vip;
    type Wire = api::Vip;

    fn to_wire(model: &Vip) -> api::Vip {
        api::Vip {
            interface: SelectedMap::from(model.interface.as_str()),
            mode: SelectedMap::from(model.mode.as_ref()),
            network: model.network.clone(),
            gateway: model.gateway.clone().unwrap_or_default(),
            description: model.description.clone().unwrap_or_default(),
        }
    }

    fn from_wire(wire: api::Vip) -> Result<Vip, ConvertError> {
        Ok(Vip {
            mode: parse_enum("mode", wire.mode.as_str())?,
            interface: wire.interface.into_string(),
            network: wire.network,
            gateway: string_or_none(wire.gateway),
            description: string_or_none(wire.description),
        })
    }

    async fn add(client: &Client, wire: &api::Vip) -> Result<String, Error> {
        client.interfaces().add_vip(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Vip, Error> {
        client.interfaces().get_vip(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Vip) -> Result<(), Error> {
        client.interfaces().update_vip(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.interfaces().delete_vip(id).await
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
    fn defaults_and_wire_names() {
        let vip: Vip = decode(json!({ "network": "192.168.1.10/24" })).unwrap();
        assert_eq!(vip.mode, VipMode::Ipalias);
        assert_eq!(vip.interface, "wan");

        let wire = VipResource::to_wire(&vip);
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({
                "interface": "wan",
                "mode": "ipalias",
                "network": "192.168.1.10/24",
                "gateway": "",
                "descr": ""
            })
        );
        assert_eq!(VipResource::from_wire(wire).unwrap(), vip);
    }

    #[test]
    fn rejects_unknown_mode_and_bad_addresses() {
        assert!(decode::<Vip>(json!({ "network": "10.0.0.1/32", "mode": "carp" })).is_err());

        let err = decode::<Vip>(json!({ "network": "10.0.0.1", "gateway": "nope" })).unwrap_err();
        let attrs: Vec<_> = err.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attrs, ["network", "gateway"]);
    }

    #[test]
    fn unknown_wire_mode_is_a_conversion_error() {
        let wire = api::Vip {
            mode: SelectedMap::from("carp"),
            ..api::Vip::default()
        };
        let err = VipResource::from_wire(wire).unwrap_err();
        assert_eq!(err.attribute, "mode");
    }
}
