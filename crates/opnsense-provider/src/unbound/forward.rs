// `opnsense_unbound_forward`: upstream servers that unbound forwards
// queries to, for one domain or for everything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::unbound as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{ConvertError, bool_to_wire, default_true, int_to_wire, wire_to_bool};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{Validate, check_ip, check_range};

const FORWARD_TYPE: &str = "forward";

fn default_dns_port() -> i64 {
    53
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forward {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Empty forwards all queries.
    #[serde(default)]
    pub domain: String,
    pub server_ip: String,
    #[serde(default = "default_dns_port")]
    pub server_port: i64,
    #[serde(default)]
    pub verify_cn: String,
}

impl Validate for Forward {
    fn validate(&self, diags: &mut Diagnostics) {
        check_ip(diags, "server_ip", &self.server_ip);
        check_range(diags, "server_port", self.server_port, 1..=65535);
    }
}

pub struct ForwardResource;

#[async_trait]
impl Crud for ForwardResource {
    const TYPE_NAME: &'static str = "unbound_forward";
    const DESCRIPTION: &'static str = "Query forwarding allows for specific domains (or all queries) to be sent to a set of upstream DNS servers.";
    const KIND: &'static str = "forward";

    type Model = Forward;
    type Wire = api::Forward;

    fn to_wire(model: &Forward) -> api::Forward {
        api::Forward {
            enabled: bool_to_wire(model.enabled),
            domain: model.domain.clone(),
            forward_type: SelectedMap::from(FORWARD_TYPE),
            server: model.server_ip.clone(),
            port: int_to_wire(model.server_port),
            verify_cn: model.verify_cn.clone(),
        }
    }

    fn from_wire(wire: api::Forward) -> Result<Forward, ConvertError> {
        // An empty port means the resolver default.
        let port = wire.port.trim();
        let server_port = if port.is_empty() {
            default_dns_port()
        } else {
            port.parse().map_err(|_| ConvertError {
                attribute: "server_port",
                value: wire.port.clone(),
            })?
        };
        Ok(Forward {
            enabled: wire_to_bool(&wire.enabled),
            domain: wire.domain,
            server_ip: wire.server,
            server_port,
            verify_cn: wire.verify_cn,
        })
    }

    async fn add(client: &Client, wire: &api::Forward) -> Result<String, Error> {
        client.unbound().add_forward(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Forward, Error> {
        client.unbound().get_forward(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Forward) -> Result<(), Error> {
        client.unbound().update_forward(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.unbound().delete_forward(id).await
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
    fn defaults_to_plain_dns_for_every_domain() {
        let forward: Forward = decode(json!({ "server_ip": "9.9.9.9" })).unwrap();
        assert!(forward.enabled);
        assert_eq!(forward.server_port, 53);

        let value = serde_json::to_value(ForwardResource::to_wire(&forward)).unwrap();
        assert_eq!(
            value,
            json!({
                "enabled": "1",
                "domain": "",
                "type": "forward",
                "server": "9.9.9.9",
                "port": "53",
                "verify": ""
            })
        );
    }

    #[test]
    fn survives_wire_round_trip() {
        let forward = Forward {
            enabled: false,
            domain: "corp.example".into(),
            server_ip: "2001:db8::53".into(),
            server_port: 853,
            verify_cn: "dns.corp.example".into(),
        };
        let json = serde_json::to_value(ForwardResource::to_wire(&forward)).unwrap();
        let wire: api::Forward = serde_json::from_value(json).unwrap();
        assert_eq!(ForwardResource::from_wire(wire).unwrap(), forward);
    }

    #[test]
    fn server_must_be_an_address() {
        let err = decode::<Forward>(json!({ "server_ip": "dns.example", "server_port": 0 }))
            .unwrap_err();
        let attrs: Vec<_> = err.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attrs, ["server_ip", "server_port"]);
    }
}
