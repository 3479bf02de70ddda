// `opnsense_ipsec_vti`: virtual tunnel interfaces for route-based VPNs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::ipsec as api;
use opnsense_api::{Client, Error};

use crate::convert::{ConvertError, bool_to_wire, default_true, wire_to_bool};
use crate::handler::Crud;
use crate::validate::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vti {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Must match the `request_id` of the child SA carrying the traffic.
    pub request_id: String,
    pub local_ip: String,
    pub remote_ip: String,
    pub tunnel_local_ip: String,
    pub tunnel_remote_ip: String,
    #[serde(default)]
    pub tunnel_local_ip2: String,
    #[serde(default)]
    pub tunnel_remote_ip2: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for Vti {}

pub struct VtiResource;

#[async_trait]
impl Crud for VtiResource {
    const TYPE_NAME: &'static str = "ipsec_vti";
    const DESCRIPTION: &'static str =
        "IPsec Virtual Tunnel Interfaces (VTIs) are used by routed IPsec VPN connections.";
    const KIND: &'static str = "IPsec VTI";

    type Model = Vti;
    type Wire = api::Vti;

    fn to_wire(model: &Vti) -> api::Vti {
        api::Vti {
            enabled: bool_to_wire(model.enabled),
            request_id: model.request_id.clone(),
            local_ip: model.local_ip.clone(),
            remote_ip: model.remote_ip.clone(),
            tunnel_local_ip: model.tunnel_local_ip.clone(),
            tunnel_remote_ip: model.tunnel_remote_ip.clone(),
            tunnel_local_ip2: model.tunnel_local_ip2.clone(),
            tunnel_remote_ip2: model.tunnel_remote_ip2.clone(),
            description: model.description.clone(),
        }
    }

    fn from_wire(wire: api::Vti) -> Result<Vti, ConvertError> {
        Ok(Vti {
            enabled: wire_to_bool(&wire.enabled),
            request_id: wire.request_id,
            local_ip: wire.local_ip,
            remote_ip: wire.remote_ip,
            tunnel_local_ip: wire.tunnel_local_ip,
            tunnel_remote_ip: wire.tunnel_remote_ip,
            tunnel_local_ip2: wire.tunnel_local_ip2,
            tunnel_remote_ip2: wire.tunnel_remote_ip2,
            description: wire.description,
        })
    }

    async fn add(client: &Client, wire: &api::Vti) -> Result<String, Error> {
        client.ipsec().add_vti(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Vti, Error> {
        client.ipsec().get_vti(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Vti) -> Result<(), Error> {
        client.ipsec().update_vti(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.ipsec().delete_vti(id).await
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
    fn secondary_tunnel_addresses_are_optional() {
        let vti: Vti = decode(json!({
            "request_id": "100",
            "local_ip": "203.0.113.1",
            "remote_ip": "198.51.100.7",
            "tunnel_local_ip": "169.254.0.1",
            "tunnel_remote_ip": "169.254.0.2"
        }))
        .unwrap();
        let value = serde_json::to_value(VtiResource::to_wire(&vti)).unwrap();
        assert_eq!(value["reqid"], "100");
        assert_eq!(value["tunnel_local2"], "");
        assert_eq!(value["enabled"], "1");

        let back = VtiResource::from_wire(serde_json::from_value(value).unwrap()).unwrap();
        assert_eq!(back, vti);
    }
}
