// `opnsense_wireguard_server`: local WireGuard tunnel instances.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::wireguard as api;
use opnsense_api::{Client, Error};

use crate::convert::{
    ConvertError, bool_to_wire, default_true, default_unset, int_or_unset_to_wire, set_to_wire,
    wire_to_bool, wire_to_int_or_unset, wire_to_set,
};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{INVALID_ATTRIBUTE, Validate, check_cidr, check_uuid_v4};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub name: String,
    /// 256-bit base64 keys.
    pub public_key: String,
    pub private_key: String,
    /// `-1` lets the appliance pick a port from 51820 up.
    #[serde(default = "default_unset")]
    pub port: i64,
    /// `-1` uses the MTU of the parent interface.
    #[serde(default = "default_unset")]
    pub mtu: i64,
    #[serde(default)]
    pub dns: BTreeSet<String>,
    #[serde(default)]
    pub tunnel_address: BTreeSet<String>,
    /// Client UUIDs.
    #[serde(default)]
    pub peers: BTreeSet<String>,
    #[serde(default)]
    pub disable_routes: bool,
    #[serde(default)]
    pub gateway: String,
    /// Interface number (`wgN`), assigned by the appliance.
    #[serde(default)]
    pub instance: String,
}

impl Validate for Server {
    fn validate(&self, diags: &mut Diagnostics) {
        for address in &self.tunnel_address {
            check_cidr(diags, "tunnel_address", address);
        }
        for peer in &self.peers {
            check_uuid_v4(diags, "peers", peer);
        }
        if !self.gateway.is_empty() && !self.disable_routes {
            diags.add_attribute_error(
                "gateway",
                INVALID_ATTRIBUTE,
                "Attribute gateway is only used when disable_routes is true",
            );
        }
    }
}

pub struct ServerResource;

#[async_trait]
impl Crud for ServerResource {
    const TYPE_NAME: &'static str = "wireguard_server";
    const DESCRIPTION: &'static str = "Server resources can be used to setup Wireguard servers.";
    const KIND: &'static str = "wg server";

    const READ_AFTER_CREATE: bool = true;

    type Model = Server;
    type Wire = api::Server;

    fn to_wire(model: &Server) -> api::Server {
        api::Server {
            enabled: bool_to_wire(model.enabled),
            name: model.name.clone(),
            public_key: model.public_key.clone(),
            private_key: model.private_key.clone(),
            port: int_or_unset_to_wire(model.port),
            mtu: int_or_unset_to_wire(model.mtu),
            dns: set_to_wire(&model.dns),
            tunnel_address: set_to_wire(&model.tunnel_address),
            peers: set_to_wire(&model.peers),
            disable_routes: bool_to_wire(model.disable_routes),
            gateway: model.gateway.clone(),
            // The appliance assigns the instance; it rejects anything but empty.
            instance: String::new(),
        }
    }

    fn from_wire(wire: api::Server) -> Result<Server, ConvertError> {
        Ok(Server {
            enabled: wire_to_bool(&wire.enabled),
            name: wire.name,
            public_key: wire.public_key,
            private_key: wire.private_key,
            port: wire_to_int_or_unset(&wire.port),
            mtu: wire_to_int_or_unset(&wire.mtu),
            dns: wire_to_set(wire.dns.into_vec()),
            tunnel_address: wire_to_set(wire.tunnel_address.into_vec()),
            peers: wire_to_set(wire.peers.into_vec()),
            disable_routes: wire_to_bool(&wire.disable_routes),
            gateway: wire.gateway,
            instance: wire.instance,
        })
    }

    async fn add(client: &Client, wire: &api::Server) -> Result<String, Error> {
        client.wireguard().add_server(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Server, Error> {
        client.wireguard().get_server(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Server) -> Result<(), Error> {
        client.wireguard().update_server(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.wireguard().delete_server(id).await
    }

    fn carry_assigned(mut planned: Server, known: &Server) -> Server {
        if planned.instance.is_empty() {
            planned.instance.clone_from(&known.instance);
        }
        planned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::validate::decode;

    fn server() -> Server {
        decode(json!({
            "name": "wg-home",
            "public_key": "cHVibGlj",
            "private_key": "cHJpdmF0ZQ=="
        }))
        .unwrap()
    }

    #[test]
    fn unset_port_and_mtu_are_empty_on_the_wire() {
        let value = serde_json::to_value(ServerResource::to_wire(&server())).unwrap();
        assert_eq!(value["port"], "");
        assert_eq!(value["mtu"], "");
        assert_eq!(value["enabled"], "1");
        assert_eq!(value["disableroutes"], "0");
        assert_eq!(value["instance"], "");
    }

    #[test]
    fn survives_wire_round_trip() {
        let model = Server {
            port: 51820,
            mtu: 1420,
            dns: BTreeSet::from(["1.1.1.1".to_owned()]),
            tunnel_address: BTreeSet::from(["10.8.0.1/24".to_owned(), "fd00::1/64".to_owned()]),
            peers: BTreeSet::from(["0b9f6a4e-2d4c-4e1a-8f3b-7c6d5e4f3a2b".to_owned()]),
            disable_routes: true,
            gateway: "10.8.0.254".into(),
            ..server()
        };
        let json = serde_json::to_value(ServerResource::to_wire(&model)).unwrap();
        let wire: api::Server = serde_json::from_value(json).unwrap();
        assert_eq!(ServerResource::from_wire(wire).unwrap(), model);
    }

    #[test]
    fn assigned_instance_is_kept() {
        let known = Server {
            instance: "2".into(),
            ..server()
        };
        assert_eq!(ServerResource::carry_assigned(server(), &known).instance, "2");
    }

    #[test]
    fn gateway_needs_disabled_routes() {
        let err = decode::<Server>(json!({
            "name": "wg-home",
            "public_key": "a",
            "private_key": "b",
            "gateway": "10.8.0.254",
            "tunnel_address": ["10.8.0.1"]
        }))
        .unwrap_err();
        let attrs: Vec<_> = err.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attrs, ["tunnel_address", "gateway"]);
    }
}
