// IPsec endpoints
//
// Connections and their children/local/remote auth rounds share the
// `/ipsec/connections/` controller, each with its own verb suffix.
// Pre-shared keys and VTIs have their own controllers. Every change is
// made live through `/ipsec/service/reconfigure`.

use serde::{Deserialize, Serialize};

use crate::client::{Client, Controller, Endpoints, Item};
use crate::codec::{SelectedMap, SelectedMapList};
use crate::error::Error;

const RECONFIGURE: Option<&str> = Some("/ipsec/service/reconfigure");

// ── Connection ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    pub enabled: String,
    pub proposals: SelectedMapList,
    pub unique: SelectedMap,
    pub aggressive: String,
    pub version: SelectedMap,
    pub mobike: String,
    #[serde(rename = "local_addrs")]
    pub local_addresses: SelectedMapList,
    #[serde(rename = "remote_addrs")]
    pub remote_addresses: SelectedMapList,
    // Omitted when empty; the appliance rejects "" for these.
    #[serde(skip_serializing_if = "SelectedMap::is_empty")]
    pub local_port: SelectedMap,
    #[serde(skip_serializing_if = "SelectedMap::is_empty")]
    pub remote_port: SelectedMap,
    #[serde(rename = "encap")]
    pub udp_encapsulation: String,
    #[serde(rename = "reauth_time")]
    pub reauthentication_time: String,
    pub rekey_time: String,
    #[serde(rename = "over_time")]
    pub ike_lifetime: String,
    pub dpd_delay: String,
    pub dpd_timeout: String,
    #[serde(rename = "pools")]
    pub ip_pools: SelectedMapList,
    #[serde(rename = "send_certreq")]
    pub send_certificate_request: String,
    #[serde(rename = "send_cert")]
    pub send_certificate: SelectedMap,
    #[serde(rename = "keyingtries")]
    pub keying_tries: String,
    pub description: String,
}

impl Item for Connection {
    const KIND: &'static str = "IPsec connection";
    const KEY: &'static str = "connection";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Ipsec,
        add: "/ipsec/connections/addConnection",
        get: "/ipsec/connections/getConnection",
        set: "/ipsec/connections/setConnection",
        delete: "/ipsec/connections/delConnection",
        reconfigure: RECONFIGURE,
    };
}

// ── Child SA ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Child {
    pub enabled: String,
    /// UUID of the owning connection.
    pub connection: SelectedMap,
    #[serde(rename = "reqid")]
    pub request_id: String,
    #[serde(rename = "esp_proposals")]
    pub proposals: SelectedMapList,
    pub sha256_96: String,
    pub start_action: SelectedMap,
    pub close_action: SelectedMap,
    pub dpd_action: SelectedMap,
    pub mode: SelectedMap,
    #[serde(rename = "policies")]
    pub install_policies: String,
    #[serde(rename = "local_ts")]
    pub local_networks: SelectedMapList,
    #[serde(rename = "remote_ts")]
    pub remote_networks: SelectedMapList,
    pub rekey_time: String,
    pub description: String,
}

impl Item for Child {
    const KIND: &'static str = "IPsec child";
    const KEY: &'static str = "child";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Ipsec,
        add: "/ipsec/connections/addChild",
        get: "/ipsec/connections/getChild",
        set: "/ipsec/connections/setChild",
        delete: "/ipsec/connections/delChild",
        reconfigure: RECONFIGURE,
    };
}

// ── Authentication rounds ────────────────────────────────────────────

/// Fields shared by local and remote authentication rounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub enabled: String,
    pub connection: SelectedMap,
    pub round: String,
    #[serde(rename = "auth")]
    pub authentication: SelectedMap,
    #[serde(rename = "id")]
    pub auth_id: String,
    pub eap_id: String,
    #[serde(rename = "certs")]
    pub certificates: SelectedMapList,
    #[serde(rename = "pubkeys")]
    pub public_keys: SelectedMapList,
    pub description: String,
}

/// Local authentication round (`{"local": {...}}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthLocal(pub Auth);

/// Remote authentication round (`{"remote": {...}}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthRemote(pub Auth);

impl Item for AuthLocal {
    const KIND: &'static str = "IPsec local auth";
    const KEY: &'static str = "local";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Ipsec,
        add: "/ipsec/connections/addLocal",
        get: "/ipsec/connections/getLocal",
        set: "/ipsec/connections/setLocal",
        delete: "/ipsec/connections/delLocal",
        reconfigure: RECONFIGURE,
    };
}

impl Item for AuthRemote {
    const KIND: &'static str = "IPsec remote auth";
    const KEY: &'static str = "remote";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Ipsec,
        add: "/ipsec/connections/addRemote",
        get: "/ipsec/connections/getRemote",
        set: "/ipsec/connections/setRemote",
        delete: "/ipsec/connections/delRemote",
        reconfigure: RECONFIGURE,
    };
}

// ── Pre-shared key ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Psk {
    #[serde(rename = "ident")]
    pub identity_local: String,
    #[serde(rename = "remote_ident")]
    pub identity_remote: String,
    #[serde(rename = "Key")]
    pub pre_shared_key: String,
    #[serde(rename = "keyType")]
    pub key_type: SelectedMap,
    pub description: String,
}

impl Item for Psk {
    const KIND: &'static str = "IPsec pre-shared key";
    const KEY: &'static str = "preSharedKey";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Ipsec,
        add: "/ipsec/pre_shared_keys/addItem",
        get: "/ipsec/pre_shared_keys/getItem",
        set: "/ipsec/pre_shared_keys/setItem",
        delete: "/ipsec/pre_shared_keys/delItem",
        reconfigure: RECONFIGURE,
    };
}

// ── VTI ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vti {
    pub enabled: String,
    #[serde(rename = "reqid")]
    pub request_id: String,
    #[serde(rename = "local")]
    pub local_ip: String,
    #[serde(rename = "remote")]
    pub remote_ip: String,
    #[serde(rename = "tunnel_local")]
    pub tunnel_local_ip: String,
    #[serde(rename = "tunnel_remote")]
    pub tunnel_remote_ip: String,
    #[serde(rename = "tunnel_local2")]
    pub tunnel_local_ip2: String,
    #[serde(rename = "tunnel_remote2")]
    pub tunnel_remote_ip2: String,
    pub description: String,
}

impl Item for Vti {
    const KIND: &'static str = "IPsec VTI";
    const KEY: &'static str = "vti";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Ipsec,
        add: "/ipsec/vti/addItem",
        get: "/ipsec/vti/getItem",
        set: "/ipsec/vti/setItem",
        delete: "/ipsec/vti/delItem",
        reconfigure: RECONFIGURE,
    };
}

// ── Accessor ─────────────────────────────────────────────────────────

/// IPsec endpoint group, returned by [`Client::ipsec`].
#[derive(Debug, Clone, Copy)]
pub struct Ipsec<'a> {
    client: &'a Client,
}

impl<'a> Ipsec<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn add_connection(&self, connection: &Connection) -> Result<String, Error> {
        self.client.add_item(connection).await
    }

    pub async fn get_connection(&self, id: &str) -> Result<Connection, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_connection(&self, id: &str, connection: &Connection) -> Result<(), Error> {
        self.client.update_item(id, connection).await
    }

    pub async fn delete_connection(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Connection>(id).await
    }

    pub async fn add_child(&self, child: &Child) -> Result<String, Error> {
        self.client.add_item(child).await
    }

    pub async fn get_child(&self, id: &str) -> Result<Child, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_child(&self, id: &str, child: &Child) -> Result<(), Error> {
        self.client.update_item(id, child).await
    }

    pub async fn delete_child(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Child>(id).await
    }

    pub async fn add_auth_local(&self, auth: &AuthLocal) -> Result<String, Error> {
        self.client.add_item(auth).await
    }

    pub async fn get_auth_local(&self, id: &str) -> Result<AuthLocal, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_auth_local(&self, id: &str, auth: &AuthLocal) -> Result<(), Error> {
        self.client.update_item(id, auth).await
    }

    pub async fn delete_auth_local(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<AuthLocal>(id).await
    }

    pub async fn add_auth_remote(&self, auth: &AuthRemote) -> Result<String, Error> {
        self.client.add_item(auth).await
    }

    pub async fn get_auth_remote(&self, id: &str) -> Result<AuthRemote, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_auth_remote(&self, id: &str, auth: &AuthRemote) -> Result<(), Error> {
        self.client.update_item(id, auth).await
    }

    pub async fn delete_auth_remote(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<AuthRemote>(id).await
    }

    pub async fn add_psk(&self, psk: &Psk) -> Result<String, Error> {
        self.client.add_item(psk).await
    }

    pub async fn get_psk(&self, id: &str) -> Result<Psk, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_psk(&self, id: &str, psk: &Psk) -> Result<(), Error> {
        self.client.update_item(id, psk).await
    }

    pub async fn delete_psk(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Psk>(id).await
    }

    pub async fn add_vti(&self, vti: &Vti) -> Result<String, Error> {
        self.client.add_item(vti).await
    }

    pub async fn get_vti(&self, id: &str) -> Result<Vti, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_vti(&self, id: &str, vti: &Vti) -> Result<(), Error> {
        self.client.update_item(id, vti).await
    }

    pub async fn delete_vti(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Vti>(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_ports_are_omitted() {
        let connection = Connection {
            remote_port: SelectedMap::from("4500"),
            ..Connection::default()
        };
        let value = serde_json::to_value(&connection).unwrap();
        assert!(value.get("local_port").is_none());
        assert_eq!(value["remote_port"], json!("4500"));
    }

    #[test]
    fn auth_round_is_transparent() {
        let auth = AuthRemote(Auth {
            authentication: SelectedMap::from("psk"),
            ..Auth::default()
        });
        let value = serde_json::to_value(&auth).unwrap();
        assert_eq!(value["auth"], json!("psk"));

        let back: AuthRemote = serde_json::from_value(json!({
            "auth": { "psk": { "value": "Pre-Shared Key", "selected": 1 } },
            "round": "0"
        }))
        .unwrap();
        assert_eq!(back.0.authentication.as_str(), "psk");
        assert_eq!(back.0.round, "0");
    }
}
