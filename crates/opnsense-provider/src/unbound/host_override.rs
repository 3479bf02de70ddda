// `opnsense_unbound_host_override`: local A/AAAA/MX records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::unbound as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{
    ConvertError, bool_to_wire, default_true, opt_int_to_wire, parse_enum, string_or_none,
    unset_int, wire_to_bool, wire_to_opt_int,
};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{INVALID_ATTRIBUTE, Validate};

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
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RecordType {
    #[default]
    A,
    Aaaa,
    Mx,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOverride {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Host part only; `*` for a wildcard entry.
    pub hostname: String,
    pub domain: String,
    #[serde(rename = "type", default)]
    pub record_type: RecordType,
    /// Address answered for `A`/`AAAA` records.
    #[serde(default)]
    pub server: String,
    #[serde(default, deserialize_with = "unset_int")]
    pub mx_priority: Option<i64>,
    #[serde(default)]
    pub mx_host: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for HostOverride {
    fn validate(&self, diags: &mut Diagnostics) {
        match (self.mx_priority.is_some(), self.mx_host.is_empty()) {
            (true, true) => diags.add_attribute_error(
                "mx_priority",
                INVALID_ATTRIBUTE,
                "Attribute \"mx_host\" must be specified when \"mx_priority\" is specified",
            ),
            (false, false) => diags.add_attribute_error(
                "mx_host",
                INVALID_ATTRIBUTE,
                "Attribute \"mx_priority\" must be specified when \"mx_host\" is specified",
            ),
            _ => {}
        }
    }
}

pub struct HostOverrideResource;

#[async_trait]
impl Crud for HostOverrideResource {
    const TYPE_NAME: &'static str = "unbound_host_override";
    const DESCRIPTION: &'static str = "Host overrides can be used to change DNS results from client queries or to add custom DNS records.";
    const KIND: &'static str = "host override";

    type Model = HostOverride;
    type Wire = api::HostOverride;

    fn to_wire(model: &HostOverride) -> api::HostOverride {
        api::HostOverride {
            enabled: bool_to_wire(model.enabled),
            hostname: model.hostname.clone(),
            domain: model.domain.clone(),
            record_type: SelectedMap::from(model.record_type.as_ref()),
            server: model.server.clone(),
            mx_priority: opt_int_to_wire(model.mx_priority),
            mx_host: model.mx_host.clone(),
            description: model.description.clone().unwrap_or_default(),
        }
    }

    fn from_wire(wire: api::HostOverride) -> Result<HostOverride, ConvertError> {
        Ok(HostOverride {
            enabled: wire_to_bool(&wire.enabled),
            hostname: wire.hostname,
            domain: wire.domain,
            record_type: parse_enum("type", wire.record_type.as_str())?,
            server: wire.server,
            mx_priority: wire_to_opt_int(&wire.mx_priority),
            mx_host: wire.mx_host,
            description: string_or_none(wire.description),
        })
    }

    async fn add(client: &Client, wire: &api::HostOverride) -> Result<String, Error> {
        client.unbound().add_host_override(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::HostOverride, Error> {
        client.unbound().get_host_override(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::HostOverride) -> Result<(), Error> {
        client.unbound().update_host_override(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.unbound().delete_host_override(id).await
    }
}
