// `opnsense_firewall_alias`: named lists of hosts, networks, ports, URLs
// and other matchable entities.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::firewall as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{
    ConvertError, bool_to_wire, default_true, opt_float_to_wire, parse_enum, set_to_wire,
    string_or_none, unset_float, wire_to_bool, wire_to_opt_float, wire_to_set,
};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{Validate, check_len, check_uuid_v4};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AliasType {
    Host,
    Network,
    Port,
    Url,
    Urltable,
    Geoip,
    Networkgroup,
    Mac,
    Asn,
    Dynipv6host,
    Authgroup,
    Internal,
    External,
}

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
pub enum IpVersion {
    #[default]
    IPv4,
    IPv6,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub name: String,
    #[serde(rename = "type")]
    pub alias_type: AliasType,
    /// Only meaningful for `asn`, `geoip` and `external` aliases.
    #[serde(default)]
    pub ip_protocol: IpVersion,
    /// Only meaningful for `dynipv6host` aliases.
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub content: BTreeSet<String>,
    /// Category UUIDs.
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Refresh interval in days for `urltable` aliases.
    #[serde(default, deserialize_with = "unset_float")]
    pub update_freq: Option<f64>,
    #[serde(default)]
    pub stats: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for Alias {
    fn validate(&self, diags: &mut Diagnostics) {
        check_len(diags, "name", &self.name, 1..=31);
        for category in &self.categories {
            check_uuid_v4(diags, "categories", category);
        }
    }
}

pub struct AliasResource;

#[async_trait]
impl Crud for AliasResource {
    const TYPE_NAME: &'static str = "firewall_alias";
    const DESCRIPTION: &'static str = "Aliases are named lists of networks, hosts or ports that can be used as one entity by selecting the alias name in the various supported sections of the firewall. These aliases are particularly useful to condense firewall rules and minimize changes.";
    const KIND: &'static str = "firewall alias";

    type Model = Alias;
    type Wire = api::Alias;

    fn to_wire(model: &Alias) -> api::Alias {
        api::Alias {
            enabled: bool_to_wire(model.enabled),
            name: model.name.clone(),
            alias_type: SelectedMap::from(model.alias_type.as_ref()),
            ip_protocol: SelectedMap::from(model.ip_protocol.as_ref()),
            interface: SelectedMap::from(model.interface.as_str()),
            content: set_to_wire(&model.content),
            categories: set_to_wire(&model.categories),
            update_freq: opt_float_to_wire(model.update_freq),
            statistics: bool_to_wire(model.stats),
            description: model.description.clone().unwrap_or_default(),
        }
    }

    fn from_wire(wire: api::Alias) -> Result<Alias, ConvertError> {
        // Older firmware leaves `proto` empty for types that ignore it.
        let ip_protocol = if wire.ip_protocol.is_empty() {
            IpVersion::default()
        } else {
            parse_enum("ip_protocol", wire.ip_protocol.as_str())?
        };
        Ok(Alias {
            enabled: wire_to_bool(&wire.enabled),
            name: wire.name,
            alias_type: parse_enum("type", wire.alias_type.as_str())?,
            ip_protocol,
            interface: wire.interface.into_string(),
            content: wire_to_set(wire.content.into_vec()),
            categories: wire_to_set(wire.categories.into_vec()),
            update_freq: wire_to_opt_float(&wire.update_freq),
            stats: wire_to_bool(&wire.statistics),
            description: string_or_none(wire.description),
        })
    }

    async fn add(client: &Client, wire: &api::Alias) -> Result<String, Error> {
        client.firewall().add_alias(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Alias, Error> {
        client.firewall().get_alias(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Alias) -> Result<(), Error> {
        client.firewall().update_alias(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.firewall().delete_alias(id).await
    }
}
