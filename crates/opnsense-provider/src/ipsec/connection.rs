// `opnsense_ipsec_connection`: IKE (phase 1) connections.

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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// IKE proposals, e.g. `aes256-sha256-modp2048`.
    pub proposals: BTreeSet<String>,
    /// Connection uniqueness policy (`no`, `never`, `keep`, `replace`).
    pub unique: String,
    pub aggressive: bool,
    /// IKE version: `0` (any), `1` or `2`.
    pub version: String,
    pub mobike: bool,
    pub local_addresses: BTreeSet<String>,
    pub remote_addresses: BTreeSet<String>,
    /// Empty for the default IKE port.
    #[serde(default)]
    pub local_port: String,
    #[serde(default)]
    pub remote_port: String,
    pub udp_encapsulation: bool,
    pub reauthentication_time: String,
    pub rekey_time: String,
    pub ike_lifetime: String,
    pub dpd_delay: String,
    pub dpd_timeout: String,
    #[serde(default)]
    pub ip_pools: BTreeSet<String>,
    pub send_certificate_request: bool,
    /// `ifasked`, `never` or `always`; empty for the default.
    pub send_certificate: String,
    pub keying_tries: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for Connection {}

pub struct ConnectionResource;

#[async_trait]
impl Crud for ConnectionResource {
    const TYPE_NAME: &'static str = "ipsec_connection";
    const DESCRIPTION: &'static str =
        "IPsec Connections are used for establishing secure communication channels.";
    const KIND: &'static str = "IPsec connection";

    type Model = Connection;
    type Wire = api::Connection;

    fn to_wire(model: &Connection) -> api::Connection {
        api::Connection {
            enabled: bool_to_wire(model.enabled),
            proposals: set_to_wire(&model.proposals),
            unique: SelectedMap::from(model.unique.as_str()),
            aggressive: bool_to_wire(model.aggressive),
            version: SelectedMap::from(model.version.as_str()),
            mobike: bool_to_wire(model.mobike),
            local_addresses: set_to_wire(&model.local_addresses),
            remote_addresses: set_to_wire(&model.remote_addresses),
            local_port: SelectedMap::from(model.local_port.as_str()),
            remote_port: SelectedMap::from(model.remote_port.as_str()),
            udp_encapsulation: bool_to_wire(model.udp_encapsulation),
            reauthentication_time: model.reauthentication_time.clone(),
            rekey_time: model.rekey_time.clone(),
            ike_lifetime: model.ike_lifetime.clone(),
            dpd_delay: model.dpd_delay.clone(),
            dpd_timeout: model.dpd_timeout.clone(),
            ip_pools: set_to_wire(&model.ip_pools),
            send_certificate_request: bool_to_wire(model.send_certificate_request),
            send_certificate: SelectedMap::from(model.send_certificate.as_str()),
            keying_tries: model.keying_tries.clone(),
            description: model.description.clone(),
        }
    }

    fn from_wire(wire: api::Connection) -> Result<Connection, ConvertError> {
        Ok(Connection {
            enabled: wire_to_bool(&wire.enabled),
            proposals: wire_to_set(wire.proposals.into_vec()),
            unique: wire.unique.into_string(),
            aggressive: wire_to_bool(&wire.aggressive),
            version: wire.version.into_string(),
            mobike: wire_to_bool(&wire.mobike),
            local_addresses: wire_to_set(wire.local_addresses.into_vec()),
            remote_addresses: wire_to_set(wire.remote_addresses.into_vec()),
            local_port: wire.local_port.into_string(),
            remote_port: wire.remote_port.into_string(),
            udp_encapsulation: wire_to_bool(&wire.udp_encapsulation),
            reauthentication_time: wire.reauthentication_time,
            rekey_time: wire.rekey_time,
            ike_lifetime: wire.ike_lifetime,
            dpd_delay: wire.dpd_delay,
            dpd_timeout: wire.dpd_timeout,
            ip_pools: wire_to_set(wire.ip_pools.into_vec()),
            send_certificate_request: wire_to_bool(&wire.send_certificate_request),
            send_certificate: wire.send_certificate.into_string(),
            keying_tries: wire.keying_tries,
            description: wire.description,
        })
    }

    async fn add(client: &Client, wire: &api::Connection) -> Result<String, Error> {
        client.ipsec().add_connection(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Connection, Error> {
        client.ipsec().get_connection(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Connection) -> Result<(), Error> {
        client.ipsec().update_connection(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.ipsec().delete_connection(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::validate::decode;

    fn connection() -> Connection {
        decode(json!({
            "proposals": ["aes256-sha256-modp2048", "aes128-sha256-modp2048"],
            "unique": "no",
            "aggressive": false,
            "version": "2",
            "mobike": true,
            "local_addresses": ["203.0.113.1"],
            "remote_addresses": ["198.51.100.7", "198.51.100.2"],
            "udp_encapsulation": false,
            "reauthentication_time": "0",
            "rekey_time": "",
            "ike_lifetime": "",
            "dpd_delay": "",
            "dpd_timeout": "",
            "send_certificate_request": true,
            "send_certificate": "",
            "keying_tries": "",
            "description": "site-b"
        }))
        .unwrap()
    }

    #[test]
    fn ports_are_left_out_when_empty() {
        let wire = serde_json::to_value(ConnectionResource::to_wire(&connection())).unwrap();
        assert!(wire.get("local_port").is_none());
        assert!(wire.get("remote_port").is_none());
        assert_eq!(wire["remote_addrs"], "198.51.100.2,198.51.100.7");
        assert_eq!(wire["proposals"], "aes128-sha256-modp2048,aes256-sha256-modp2048");
        assert_eq!(wire["mobike"], "1");
    }

    #[test]
    fn reads_back_unchanged() {
        let connection = connection();
        let wire = ConnectionResource::to_wire(&connection);
        assert_eq!(ConnectionResource::from_wire(wire).unwrap(), connection);
    }

    #[test]
    fn flags_are_required() {
        let mut config = serde_json::to_value(connection()).unwrap();
        config.as_object_mut().unwrap().remove("mobike");
        let err = decode::<Connection>(config).unwrap_err();
        assert!(err.iter().any(|d| d.detail.contains("mobike")));
    }
}
