// `opnsense_unbound_domain_override`: forward queries for a domain to a
// specific server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::unbound as api;
use opnsense_api::{Client, Error};

use crate::convert::{ConvertError, bool_to_wire, default_true, string_or_none, wire_to_bool};
use crate::handler::Crud;
use crate::validate::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainOverride {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Need not be a real TLD, e.g. `test` or `1.168.192.in-addr.arpa`.
    pub domain: String,
    /// `address[@port]` of the authoritative server.
    pub server: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for DomainOverride {}

pub struct DomainOverrideResource;

#[async_trait]
impl Crud for DomainOverrideResource {
    const TYPE_NAME: &'static str = "unbound_domain_override";
    const DESCRIPTION: &'static str = "Domain overrides can be used to forward queries for specific domains (and subsequent subdomains) to local or remote DNS servers.";
    const KIND: &'static str = "domain override";

    type Model = DomainOverride;
    type Wire = api::DomainOverride;

    fn to_wire(model: &DomainOverride) -> api::DomainOverride {
        api::DomainOverride {
            enabled: bool_to_wire(model.enabled),
            domain: model.domain.clone(),
            server: model.server.clone(),
            description: model.description.clone().unwrap_or_default(),
        }
    }

    fn from_wire(wire: api::DomainOverride) -> Result<DomainOverride, ConvertError> {
        Ok(DomainOverride {
            enabled: wire_to_bool(&wire.enabled),
            domain: wire.domain,
            server: wire.server,
            description: string_or_none(wire.description),
        })
    }

    async fn add(client: &Client, wire: &api::DomainOverride) -> Result<String, Error> {
        client.unbound().add_domain_override(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::DomainOverride, Error> {
        client.unbound().get_domain_override(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::DomainOverride) -> Result<(), Error> {
        client.unbound().update_domain_override(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.unbound().delete_domain_override(id).await
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
    fn empty_description_reads_back_as_null() {
        let wire = api::DomainOverride {
            enabled: "0".into(),
            domain: "1.168.192.in-addr.arpa".into(),
            server: "192.168.1.53@5353".into(),
            description: String::new(),
        };
        let model = DomainOverrideResource::from_wire(wire).unwrap();
        assert!(!model.enabled);
        assert_eq!(model.description, None);

        let planned: DomainOverride = decode(json!({
            "enabled": false,
            "domain": "1.168.192.in-addr.arpa",
            "server": "192.168.1.53@5353"
        }))
        .unwrap();
        assert_eq!(planned, model);
    }
}
