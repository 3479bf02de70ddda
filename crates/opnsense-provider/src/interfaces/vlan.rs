// `opnsense_interfaces_vlan`: 802.1Q VLAN devices.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::interfaces as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{ConvertError, int_to_wire, string_or_none};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{Validate, check_range};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    #[serde(default)]
    pub description: Option<String>,
    pub tag: i64,
    #[serde(default)]
    pub priority: i64,
    /// Parent device, e.g. `vtnet0`.
    pub parent: String,
    /// Device name (`vlan0.10`). Empty lets the appliance pick one.
    #[serde(default)]
    pub device: String,
}

impl Validate for Vlan {
    fn validate(&self, diags: &mut Diagnostics) {
        check_range(diags, "tag", self.tag, 1..=4094);
        check_range(diags, "priority", self.priority, 0..=7);
    }
}

pub struct VlanResource;

#[async_trait]
impl Crud for VlanResource {
    const TYPE_NAME: &'static str = "interfaces_vlan";
    const DESCRIPTION: &'static str = "VLANs (Virtual LANs) can be used to segment a single physical network into multiple virtual networks.";
    const KIND: &'static str = "VLAN";

    type Model = Vlan;
    type Wire = api::Vlan;

    fn to_wire(model: &Vlan) -> api::Vlan {
        api::Vlan {
            description: model.description.clone().unwrap_or_default(),
            tag: int_to_wire(model.tag),
            priority: SelectedMap::new(int_to_wire(model.priority)),
            parent: SelectedMap::from(model.parent.as_str()),
            device: model.device.clone(),
        }
    }

    fn from_wire(wire: api::Vlan) -> Result<Vlan, ConvertError> {
        let tag = wire.tag.trim().parse().map_err(|_| ConvertError {
            attribute: "tag",
            value: wire.tag.clone(),
        })?;
        Ok(Vlan {
            description: string_or_none(wire.description),
            tag,
            priority: wire.priority.as_str().parse().unwrap_or_default(),
            parent: wire.parent.into_string(),
            device: wire.device,
        })
    }

    async fn add(client: &Client, wire: &api::Vlan) -> Result<String, Error> {
        client.interfaces().add_vlan(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Vlan, Error> {
        client.interfaces().get_vlan(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Vlan) -> Result<(), Error> {
        client.interfaces().update_vlan(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.interfaces().delete_vlan(id).await
    }

    /// A device left empty in configuration stays empty in state, whatever
    /// name the appliance generated.
    fn refresh(prior: Option<&Vlan>, mut fresh: Vlan) -> Vlan {
        if prior.is_some_and(|p| p.device.is_empty()) {
            fresh.device.clear();
        }
        fresh
    }
}
