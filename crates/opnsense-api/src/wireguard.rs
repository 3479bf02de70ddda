// WireGuard endpoints (`/wireguard/server/`, `/wireguard/client/`).
//
// Servers are the local tunnel instances, clients are the peers that
// servers reference by UUID. Both go live after `/wireguard/service/reconfigure`.

use serde::{Deserialize, Serialize};

use crate::client::{Client, Controller, Endpoints, Item};
use crate::codec::SelectedMapList;
use crate::error::Error;

const RECONFIGURE: Option<&str> = Some("/wireguard/service/reconfigure");

// ── Server ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub enabled: String,
    pub name: String,
    #[serde(rename = "pubkey")]
    pub public_key: String,
    #[serde(rename = "privkey")]
    pub private_key: String,
    pub port: String,
    pub mtu: String,
    pub dns: SelectedMapList,
    #[serde(rename = "tunneladdress")]
    pub tunnel_address: SelectedMapList,
    /// Client UUIDs.
    pub peers: SelectedMapList,
    #[serde(rename = "disableroutes")]
    pub disable_routes: String,
    pub gateway: String,
    /// Assigned by the appliance (`wgN`); always sent empty.
    pub instance: String,
}

impl Item for Server {
    const KIND: &'static str = "wireguard server";
    const KEY: &'static str = "server";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Wireguard,
        add: "/wireguard/server/addServer",
        get: "/wireguard/server/getServer",
        set: "/wireguard/server/setServer",
        delete: "/wireguard/server/delServer",
        reconfigure: RECONFIGURE,
    };
}

// ── Client ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Peer {
    pub enabled: String,
    pub name: String,
    #[serde(rename = "pubkey")]
    pub public_key: String,
    pub psk: String,
    #[serde(rename = "tunneladdress")]
    pub tunnel_address: SelectedMapList,
    #[serde(rename = "serveraddress")]
    pub server_address: String,
    #[serde(rename = "serverport")]
    pub server_port: String,
    #[serde(rename = "keepalive")]
    pub keep_alive: String,
}

impl Item for Peer {
    const KIND: &'static str = "wireguard client";
    const KEY: &'static str = "client";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Wireguard,
        add: "/wireguard/client/addClient",
        get: "/wireguard/client/getClient",
        set: "/wireguard/client/setClient",
        delete: "/wireguard/client/delClient",
        reconfigure: RECONFIGURE,
    };
}

// ── Accessor ─────────────────────────────────────────────────────────

/// WireGuard endpoint group, returned by [`Client::wireguard`].
#[derive(Debug, Clone, Copy)]
pub struct Wireguard<'a> {
    client: &'a Client,
}

impl<'a> Wireguard<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn add_server(&self, server: &Server) -> Result<String, Error> {
        self.client.add_item(server).await
    }

    pub async fn get_server(&self, id: &str) -> Result<Server, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_server(&self, id: &str, server: &Server) -> Result<(), Error> {
        self.client.update_item(id, server).await
    }

    pub async fn delete_server(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Server>(id).await
    }

    pub async fn add_client(&self, peer: &Peer) -> Result<String, Error> {
        self.client.add_item(peer).await
    }

    pub async fn get_client(&self, id: &str) -> Result<Peer, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_client(&self, id: &str, peer: &Peer) -> Result<(), Error> {
        self.client.update_item(id, peer).await
    }

    pub async fn delete_client(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Peer>(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn server_decodes_option_maps() {
        let raw = json!({
            "enabled": "1",
            "name": "wg-home",
            "pubkey": "pub",
            "privkey": "priv",
            "port": "51820",
            "mtu": "",
            "dns": { "1.1.1.1": { "value": "1.1.1.1", "selected": 1 } },
            "tunneladdress": {
                "10.8.0.1/24": { "value": "10.8.0.1/24", "selected": 1 },
                "fd00::1/64": { "value": "fd00::1/64", "selected": 1 }
            },
            "peers": {
                "c1": { "value": "laptop", "selected": 1 },
                "c2": { "value": "phone", "selected": 0 }
            },
            "disableroutes": "0",
            "gateway": "",
            "instance": "0"
        });
        let server: Server = serde_json::from_value(raw).unwrap();
        assert_eq!(server.peers.as_slice(), ["c1"]);
        assert_eq!(server.tunnel_address.as_slice().len(), 2);
        assert_eq!(server.instance, "0");
    }

    #[test]
    fn peer_encodes_wire_names() {
        let peer = Peer {
            tunnel_address: SelectedMapList::from(vec!["10.8.0.2/32".to_owned()]),
            server_port: "51820".into(),
            ..Peer::default()
        };
        let value = serde_json::to_value(&peer).unwrap();
        assert_eq!(value["tunneladdress"], json!("10.8.0.2/32"));
        assert_eq!(value["serverport"], json!("51820"));
        assert_eq!(value["keepalive"], json!(""));
    }
}
