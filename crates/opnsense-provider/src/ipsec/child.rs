// `opnsense_ipsec_child`: child SAs (phase 2) of a connection.

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

fn default_start_action() -> String {
    "start".to_owned()
}

fn default_close_action() -> String {
    "none".to_owned()
}

fn default_dpd_action() -> String {
    "hold".to_owned()
}

fn default_mode() -> String {
    "tunnel".to_owned()
}

fn default_rekey_time() -> String {
    "0".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// ID of the owning `opnsense_ipsec_connection`.
    pub ipsec_connection: String,
    /// ESP proposals.
    pub proposals: BTreeSet<String>,
    /// Truncate SHA-256 HMACs to 96 bits (Linux peers before 2.6.33).
    #[serde(default)]
    pub sha256_96: bool,
    #[serde(default = "default_start_action")]
    pub start_action: String,
    #[serde(default = "default_close_action")]
    pub close_action: String,
    #[serde(default = "default_dpd_action")]
    pub dpd_action: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_true")]
    pub install_policies: bool,
    pub local_networks: BTreeSet<String>,
    pub remote_networks: BTreeSet<String>,
    #[serde(default)]
    pub request_id: String,
    #[serde(default = "default_rekey_time")]
    pub rekey_time: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for Child {}

pub struct ChildResource;

#[async_trait]
impl Crud for ChildResource {
    const TYPE_NAME: &'static str = "ipsec_child";
    const DESCRIPTION: &'static str =
        "IPsec Child Resources are used for phase 2 of IPsec VPN connections.";
    const KIND: &'static str = "IPsec child";

    type Model = Child;
    type Wire = api::Child;

    fn to_wire(model: &Child) -> api::Child {
        api::Child {
            enabled: bool_to_wire(model.enabled),
            connection: SelectedMap::from(model.ipsec_connection.as_str()),
            request_id: model.request_id.clone(),
            proposals: set_to_wire(&model.proposals),
            sha256_96: bool_to_wire(model.sha256_96),
            start_action: SelectedMap::from(model.start_action.as_str()),
            close_action: SelectedMap::from(model.close_action.as_str()),
            dpd_action: SelectedMap::from(model.dpd_action.as_str()),
            mode: SelectedMap::from(model.mode.as_str()),
            install_policies: bool_to_wire(model.install_policies),
            local_networks: set_to_wire(&model.local_networks),
            remote_networks: set_to_wire(&model.remote_networks),
            rekey_time: model.rekey_time.clone(),
            description: model.description.clone(),
        }
    }

    fn from_wire(wire: api::Child) -> Result<Child, ConvertError> {
        Ok(Child {
            enabled: wire_to_bool(&wire.enabled),
            ipsec_connection: wire.connection.into_string(),
            proposals: wire_to_set(wire.proposals.into_vec()),
            sha256_96: wire_to_bool(&wire.sha256_96),
            start_action: wire.start_action.into_string(),
            close_action: wire.close_action.into_string(),
            dpd_action: wire.dpd_action.into_string(),
            mode: wire.mode.into_string(),
            install_policies: wire_to_bool(&wire.install_policies),
            local_networks: wire_to_set(wire.local_networks.into_vec()),
            remote_networks: wire_to_set(wire.remote_networks.into_vec()),
            request_id: wire.request_id,
            rekey_time: wire.rekey_time,
            description: wire.description,
        })
    }

    async fn add(client: &Client, wire: &api::Child) -> Result<String, Error> {
        client.ipsec().add_child(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Child, Error> {
        client.ipsec().get_child(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Child) -> Result<(), Error> {
        client.ipsec().update_child(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.ipsec().delete_child(id).await
    }
}
