// `opnsense_route`: static routes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::routes as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{ConvertError, bool_to_wire, default_true, string_or_none, wire_to_bool};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{Validate, check_cidr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Gateway name, e.g. `WAN_DHCP`.
    pub gateway: String,
    /// Destination network in CIDR notation.
    pub network: String,
}

impl Validate for Route {
    fn validate(&self, diags: &mut Diagnostics) {
        check_cidr(diags, "network", &self.network);
    }
}

pub struct RouteResource;

#[async_trait]
impl Crud for RouteResource {
    const TYPE_NAME: &'static str = "route";
    const DESCRIPTION: &'static str = "Routes can be used to teach your firewall which path it should take when forwarding packets to a specific network.";
    const KIND: &'static str = "route";

    type Model = Route;
    type Wire = api::Route;

    fn to_wire(model: &Route) -> api::Route {
        api::Route {
            // The appliance stores the inverse.
            disabled: bool_to_wire(!model.enabled),
            description: model.description.clone().unwrap_or_default(),
            gateway: SelectedMap::from(model.gateway.as_str()),
            network: model.network.clone(),
        }
    }

    fn from_wire(wire: api::Route) -> Result<Route, ConvertError> {
        Ok(Route {
            enabled: !wire_to_bool(&wire.disabled),
            description: string_or_none(wire.description),
            gateway: wire.gateway.into_string(),
            network: wire.network,
        })
    }

    async fn add(client: &Client, wire: &api::Route) -> Result<String, Error> {
        client.routes().add_route(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Route, Error> {
        client.routes().get_route(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Route) -> Result<(), Error> {
        client.routes().update_route(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.routes().delete_route(id).await
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
    fn enabled_defaults_to_true_and_inverts_on_the_wire() {
        let route: Route = decode(json!({ "gateway": "WAN", "network": "10.0.0.0/8" })).unwrap();
        assert!(route.enabled);

        let wire = RouteResource::to_wire(&route);
        assert_eq!(wire.disabled, "0");
        assert_eq!(wire.description, "");
        assert_eq!(RouteResource::from_wire(wire).unwrap(), route);
    }

    #[test]
    fn disabled_route_reads_back_disabled() {
        let wire = api::Route {
            disabled: "1".into(),
            description: "backup".into(),
            gateway: SelectedMap::from("WAN2"),
            network: "192.168.0.0/16".into(),
        };
        let route = RouteResource::from_wire(wire).unwrap();
        assert!(!route.enabled);
        assert_eq!(route.description.as_deref(), Some("backup"));
    }

    #[test]
    fn network_must_be_cidr() {
        let err = decode::<Route>(json!({ "gateway": "WAN", "network": "10.0.0.1" })).unwrap_err();
        assert!(err.iter().any(|d| d.attribute.as_deref() == Some("network")));
    }
}
