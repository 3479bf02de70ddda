// `opnsense_ipsec_auth_local` and `opnsense_ipsec_auth_remote`: phase 1
// authentication rounds. Both sides share one model and differ only in
// the endpoint they are stored under.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::ipsec as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{
    ConvertError, bool_to_wire, default_true, set_to_wire, wire_to_bool, wire_to_set,
};
use crate::handler::Crud;
use crate::validate::Validate;

fn default_round() -> String {
    "1".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// ID of the owning `opnsense_ipsec_connection`.
    pub connection: String,
    /// Multiple rounds authenticate in ascending order.
    #[serde(default = "default_round")]
    pub round: String,
    /// Method, e.g. `psk`, `pubkey`, `eap-mschapv2`.
    pub authentication: String,
    /// IKE identity; empty uses the connection's address.
    #[serde(default)]
    pub auth_id: String,
    #[serde(default)]
    pub eap_id: String,
    /// Certificate refs.
    #[serde(default)]
    pub certificates: BTreeSet<String>,
    #[serde(default)]
    pub public_keys: BTreeSet<String>,
    #[serde(default)]
    pub description: String,
}

impl Validate for Auth {}

fn auth_to_wire(model: &Auth) -> api::Auth {
    api::Auth {
        enabled: bool_to_wire(model.enabled),
        connection: SelectedMap::from(model.connection.as_str()),
        round: model.round.clone(),
        authentication: SelectedMap::from(model.authentication.as_str()),
        auth_id: model.auth_id.clone(),
        eap_id: model.eap_id.clone(),
        certificates: set_to_wire(&model.certificates),
        public_keys: set_to_wire(&model.public_keys),
        description: model.description.clone(),
    }
}

fn auth_from_wire(wire: api::Auth) -> Auth {
    Auth {
        enabled: wire_to_bool(&wire.enabled),
        connection: wire.connection.into_string(),
        round: wire.round,
        authentication: wire.authentication.into_string(),
        auth_id: wire.auth_id,
        eap_id: wire.eap_id,
        certificates: wire_to_set(wire.certificates.into_vec()),
        public_keys: wire_to_set(wire.public_keys.into_vec()),
        description: wire.description,
    }
}

pub struct AuthLocalResource;

#[async_trait]
impl Crud for AuthLocalResource {
    const TYPE_NAME: &'static str = "ipsec_auth_local";
    const DESCRIPTION: &'static str =
        "IPsec AuthLocal Resources are used for phase 1 authentication of IPsec VPN connections.";
    const KIND: &'static str = "IPsec local auth";

    type Model = Auth;
    type Wire = api::AuthLocal;

    fn to_wire(model: &Auth) -> api::AuthLocal {
        api::AuthLocal(auth_to_wire(model))
    }

    fn from_wire(wire: api::AuthLocal) -> Result<Auth, ConvertError> {
        Ok(auth_from_wire(wire.0))
    }

    async fn add(client: &Client, wire: &api::AuthLocal) -> Result<String, Error> {
        client.ipsec().add_auth_local(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::AuthLocal, Error> {
        client.ipsec().get_auth_local(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::AuthLocal) -> Result<(), Error> {
        client.ipsec().update_auth_local(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.ipsec().delete_auth_local(id).await
    }
}

pub struct AuthRemoteResource;

#[async_trait]
impl Crud for AuthRemoteResource {
    const TYPE_NAME: &'static str = "ipsec_auth_remote";
    const DESCRIPTION: &'static str =
        "IPsec AuthRemote Resources are used for phase 1 authentication of IPsec VPN connections.";
    const KIND: &'static str = "IPsec remote auth";

    type Model = Auth;
    type Wire = api::AuthRemote;

    fn to_wire(model: &Auth) -> api::AuthRemote {
        api::AuthRemote(auth_to_wire(model))
    }

    fn from_wire(wire: api::AuthRemote) -> Result<Auth, ConvertError> {
        Ok(auth_from_wire(wire.0))
    }

    async fn add(client: &Client, wire: &api::AuthRemote) -> Result<String, Error> {
        client.ipsec().add_auth_remote(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::AuthRemote, Error> {
        client.ipsec().get_auth_remote(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::AuthRemote) -> Result<(), Error> {
        client.ipsec().update_auth_remote(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.ipsec().delete_auth_remote(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::validate::decode;

    fn auth() -> Auth {
        decode(json!({
            "connection": "5e0a6b8c-3c1f-4d2a-9f4e-1b2c3d4e5f60",
            "authentication": "pubkey",
            "certificates": ["64f1c2a0b9e3d", "64f1c2a0b9e3c"]
        }))
        .unwrap()
    }

    #[test]
    fn both_sides_share_the_conversion() {
        let auth = auth();
        assert_eq!(auth.round, "1");

        let local = AuthLocalResource::to_wire(&auth);
        let remote = AuthRemoteResource::to_wire(&auth);
        assert_eq!(local.0, remote.0);
        assert_eq!(local.0.certificates.as_slice(), ["64f1c2a0b9e3c", "64f1c2a0b9e3d"]);

        assert_eq!(AuthRemoteResource::from_wire(remote).unwrap(), auth);
    }

    #[test]
    fn wire_uses_short_field_names() {
        let value = serde_json::to_value(AuthLocalResource::to_wire(&auth())).unwrap();
        assert_eq!(value["auth"], "pubkey");
        assert_eq!(value["id"], "");
        assert_eq!(value["certs"], "64f1c2a0b9e3c,64f1c2a0b9e3d");
    }
}
