// Interface endpoints: virtual IPs and VLANs.

use serde::{Deserialize, Serialize};

use crate::client::{Client, Controller, Endpoints, Item};
use crate::codec::SelectedMap;
use crate::error::Error;

// ── Virtual IP ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vip {
    pub interface: SelectedMap,
    pub mode: SelectedMap,
    /// CIDR, e.g. `192.168.1.10/24`.
    pub network: String,
    pub gateway: String,
    #[serde(rename = "descr")]
    pub description: String,
}

impl Item for Vip {
    const KIND: &'static str = "virtual IP";
    const KEY: &'static str = "vip";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Interfaces,
        add: "/interfaces/vip_settings/addItem",
        get: "/interfaces/vip_settings/getItem",
        set: "/interfaces/vip_settings/setItem",
        delete: "/interfaces/vip_settings/delItem",
        reconfigure: Some("/interfaces/vip_settings/reconfigure"),
    };
}

// ── VLAN ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vlan {
    #[serde(rename = "descr")]
    pub description: String,
    pub tag: String,
    /// 802.1Q priority code point, `"0"`..`"7"`.
    #[serde(rename = "pcp")]
    pub priority: SelectedMap,
    #[serde(rename = "if")]
    pub parent: SelectedMap,
    /// Device name. Empty asks the appliance to generate one.
    #[serde(rename = "vlanif")]
    pub device: String,
}

impl Item for Vlan {
    const KIND: &'static str = "VLAN";
    const KEY: &'static str = "vlan";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Interfaces,
        add: "/interfaces/vlan_settings/addItem",
        get: "/interfaces/vlan_settings/getItem",
        set: "/interfaces/vlan_settings/setItem",
        delete: "/interfaces/vlan_settings/delItem",
        reconfigure: Some("/interfaces/vlan_settings/reconfigure"),
    };
}

// ── Accessor ─────────────────────────────────────────────────────────

/// Interface endpoint group, returned by [`Client::interfaces`].
#[derive(Debug, Clone, Copy)]
pub struct Interfaces<'a> {
    client: &'a Client,
}

impl<'a> Interfaces<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn add_vip(&self, vip: &Vip) -> Result<String, Error> {
        self.client.add_item(vip).await
    }

    pub async fn get_vip(&self, id: &str) -> Result<Vip, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_vip(&self, id: &str, vip: &Vip) -> Result<(), Error> {
        self.client.update_item(id, vip).await
    }

    pub async fn delete_vip(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Vip>(id).await
    }

    /// `POST /interfaces/vlan_settings/addItem`, then reconfigure.
    pub async fn add_vlan(&self, vlan: &Vlan) -> Result<String, Error> {
        self.client.add_item(vlan).await
    }

    pub async fn get_vlan(&self, id: &str) -> Result<Vlan, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_vlan(&self, id: &str, vlan: &Vlan) -> Result<(), Error> {
        self.client.update_item(id, vlan).await
    }

    pub async fn delete_vlan(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Vlan>(id).await
    }
}
