// `opnsense_wireguard_client`: peers that servers accept, referenced
// from `opnsense_wireguard_server.peers`.

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
use crate::validate::{Validate, check_cidr, check_range};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub name: String,
    pub public_key: String,
    /// Optional pre-shared key.
    #[serde(default)]
    pub psk: String,
    /// Addresses the peer may use inside the tunnel.
    #[serde(default)]
    pub tunnel_address: BTreeSet<String>,
    /// Endpoint address; empty for roaming peers.
    #[serde(default)]
    pub server_address: String,
    #[serde(default = "default_unset")]
    pub server_port: i64,
    /// Keepalive interval in seconds, `-1` for none.
    #[serde(default = "default_unset")]
    pub keep_alive: i64,
}

impl Validate for Peer {
    fn validate(&self, diags: &mut Diagnostics) {
        for address in &self.tunnel_address {
            check_cidr(diags, "tunnel_address", address);
        }
        if self.server_port != -1 {
            check_range(diags, "server_port", self.server_port, 1..=65535);
        }
        if self.keep_alive != -1 {
            check_range(diags, "keep_alive", self.keep_alive, 1..=86400);
        }
    }
}

pub struct PeerResource;

#[async_trait]
impl Crud for PeerResource {
    const TYPE_NAME: &'static str = "wireguard_client";
    const DESCRIPTION: &'static str =
        "Client resources can be used to setup Wireguard clients (peers).";
    const KIND: &'static str = "wg client";

    type Model = Peer;
    type Wire = api::Peer;

    fn to_wire(model: &Peer) -> api::Peer {
        api::Peer {
            enabled: bool_to_wire(model.enabled),
            name: model.name.clone(),
            public_key: model.public_key.clone(),
            psk: model.psk.clone(),
            tunnel_address: set_to_wire(&model.tunnel_address),
            server_address: model.server_address.clone(),
            server_port: int_or_unset_to_wire(model.server_port),
            keep_alive: int_or_unset_to_wire(model.keep_alive),
        }
    }

    fn from_wire(wire: api::Peer) -> Result<Peer, ConvertError> {
        Ok(Peer {
            enabled: wire_to_bool(&wire.enabled),
            name: wire.name,
            public_key: wire.public_key,
            psk: wire.psk,
            tunnel_address: wire_to_set(wire.tunnel_address.into_vec()),
            server_address: wire.server_address,
            server_port: wire_to_int_or_unset(&wire.server_port),
            keep_alive: wire_to_int_or_unset(&wire.keep_alive),
        })
    }

    async fn add(client: &Client, wire: &api::Peer) -> Result<String, Error> {
        client.wireguard().add_client(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Peer, Error> {
        client.wireguard().get_client(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Peer) -> Result<(), Error> {
        client.wireguard().update_client(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.wireguard().delete_client(id).await
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
    fn survives_wire_round_trip() {
        let peer = Peer {
            enabled: true,
            name: "laptop".into(),
            public_key: "bGFwdG9w".into(),
            psk: "c2hhcmVk".into(),
            tunnel_address: BTreeSet::from(["10.8.0.2/32".to_owned()]),
            server_address: "vpn.example.com".into(),
            server_port: 51820,
            keep_alive: 25,
        };
        let json = serde_json::to_value(PeerResource::to_wire(&peer)).unwrap();
        let wire: api::Peer = serde_json::from_value(json).unwrap();
        assert_eq!(PeerResource::from_wire(wire).unwrap(), peer);
    }

    #[test]
    fn roaming_peer_leaves_endpoint_empty() {
        let peer: Peer = decode(json!({ "name": "phone", "public_key": "cGhvbmU=" })).unwrap();
        let value = serde_json::to_value(PeerResource::to_wire(&peer)).unwrap();
        assert_eq!(value["serveraddress"], "");
        assert_eq!(value["serverport"], "");
        assert_eq!(value["keepalive"], "");
    }

    #[test]
    fn ports_and_keepalive_are_ranged() {
        let err = decode::<Peer>(json!({
            "name": "phone",
            "public_key": "k",
            "server_port": 70000,
            "keep_alive": 0
        }))
        .unwrap_err();
        let attrs: Vec<_> = err.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attrs, ["server_port", "keep_alive"]);
    }
}
