// `opnsense_unbound_host_alias`: extra names answering with a host
// override's records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::unbound as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{ConvertError, bool_to_wire, default_true, string_or_none, wire_to_bool};
use crate::handler::Crud;
use crate::validate::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAlias {
    /// ID of the `opnsense_unbound_host_override` this alias points at.
    #[serde(rename = "override")]
    pub host_override: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub hostname: String,
    pub domain: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for HostAlias {}

pub struct HostAliasResource;

#[async_trait]
impl Crud for HostAliasResource {
    const TYPE_NAME: &'static str = "unbound_host_alias";
    const DESCRIPTION: &'static str =
        "Host aliases can be used to create alternative names for a Host";
    const KIND: &'static str = "host alias";

    type Model = HostAlias;
    type Wire = api::HostAlias;

    fn to_wire(model: &HostAlias) -> api::HostAlias {
        api::HostAlias {
            enabled: bool_to_wire(model.enabled),
            host: SelectedMap::from(model.host_override.as_str()),
            hostname: model.hostname.clone(),
            domain: model.domain.clone(),
            description: model.description.clone().unwrap_or_default(),
        }
    }

    fn from_wire(wire: api::HostAlias) -> Result<HostAlias, ConvertError> {
        Ok(HostAlias {
            host_override: wire.host.into_string(),
            enabled: wire_to_bool(&wire.enabled),
            hostname: wire.hostname,
            domain: wire.domain,
            description: string_or_none(wire.description),
        })
    }

    async fn add(client: &Client, wire: &api::HostAlias) -> Result<String, Error> {
        client.unbound().add_host_alias(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::HostAlias, Error> {
        client.unbound().get_host_alias(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::HostAlias) -> Result<(), Error> {
        client.unbound().update_host_alias(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.unbound().delete_host_alias(id).await
    }
}
