// Unbound DNS endpoints (`/unbound/settings/`).
//
// Host overrides, host aliases, domain overrides and forwards. Changes take effect
// after `/unbound/service/reconfigure` restarts the resolver.

use serde::{Deserialize, Serialize};

use crate::client::{Client, Controller, Endpoints, Item};
use crate::codec::SelectedMap;
use crate::error::Error;

const RECONFIGURE: Option<&str> = Some("/unbound/service/reconfigure");

// ── Host override ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOverride {
    pub enabled: String,
    pub hostname: String,
    pub domain: String,
    /// Record type: `A`, `AAAA` or `MX`.
    #[serde(rename = "rr")]
    pub record_type: SelectedMap,
    pub server: String,
    #[serde(rename = "mxprio")]
    pub mx_priority: String,
    #[serde(rename = "mx")]
    pub mx_host: String,
    pub description: String,
}

impl Item for HostOverride {
    const KIND: &'static str = "host override";
    const KEY: &'static str = "host";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Unbound,
        add: "/unbound/settings/addHostOverride",
        get: "/unbound/settings/getHostOverride",
        set: "/unbound/settings/setHostOverride",
        delete: "/unbound/settings/delHostOverride",
        reconfigure: RECONFIGURE,
    };
}

// ── Host alias ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostAlias {
    pub enabled: String,
    /// UUID of the host override this alias points at.
    pub host: SelectedMap,
    pub hostname: String,
    pub domain: String,
    pub description: String,
}

impl Item for HostAlias {
    const KIND: &'static str = "host alias";
    const KEY: &'static str = "alias";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Unbound,
        add: "/unbound/settings/addHostAlias",
        get: "/unbound/settings/getHostAlias",
        set: "/unbound/settings/setHostAlias",
        delete: "/unbound/settings/delHostAlias",
        reconfigure: RECONFIGURE,
    };
}

// ── Domain override ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainOverride {
    pub enabled: String,
    pub domain: String,
    pub server: String,
    pub description: String,
}

impl Item for DomainOverride {
    const KIND: &'static str = "domain override";
    const KEY: &'static str = "domain";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Unbound,
        add: "/unbound/settings/addDomainOverride",
        get: "/unbound/settings/getDomainOverride",
        set: "/unbound/settings/setDomainOverride",
        delete: "/unbound/settings/delDomainOverride",
        reconfigure: RECONFIGURE,
    };
}

// ── Forward ──────────────────────────────────────────────────────────

/// A query forwarding server (the "DNS over TLS" list).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Forward {
    pub enabled: String,
    /// Empty forwards every domain.
    pub domain: String,
    /// Always `forward` for plain forwarding servers.
    #[serde(rename = "type")]
    pub forward_type: SelectedMap,
    pub server: String,
    pub port: String,
    /// Common name to verify the server certificate against.
    #[serde(rename = "verify")]
    pub verify_cn: String,
}

impl Item for Forward {
    const KIND: &'static str = "forward";
    const KEY: &'static str = "dot";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Unbound,
        add: "/unbound/settings/addDot",
        get: "/unbound/settings/getDot",
        set: "/unbound/settings/setDot",
        delete: "/unbound/settings/delDot",
        reconfigure: RECONFIGURE,
    };
}

// ── Accessor ─────────────────────────────────────────────────────────

/// Unbound endpoint group, returned by [`Client::unbound`].
#[derive(Debug, Clone, Copy)]
pub struct Unbound<'a> {
    client: &'a Client,
}

impl<'a> Unbound<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn add_host_override(&self, host: &HostOverride) -> Result<String, Error> {
        self.client.add_item(host).await
    }

    pub async fn get_host_override(&self, id: &str) -> Result<HostOverride, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_host_override(&self, id: &str, host: &HostOverride) -> Result<(), Error> {
        self.client.update_item(id, host).await
    }

    pub async fn delete_host_override(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<HostOverride>(id).await
    }

    pub async fn add_host_alias(&self, alias: &HostAlias) -> Result<String, Error> {
        self.client.add_item(alias).await
    }

    pub async fn get_host_alias(&self, id: &str) -> Result<HostAlias, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_host_alias(&self, id: &str, alias: &HostAlias) -> Result<(), Error> {
        self.client.update_item(id, alias).await
    }

    pub async fn delete_host_alias(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<HostAlias>(id).await
    }

    pub async fn add_domain_override(&self, domain: &DomainOverride) -> Result<String, Error> {
        self.client.add_item(domain).await
    }

    pub async fn get_domain_override(&self, id: &str) -> Result<DomainOverride, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_domain_override(
        &self,
        id: &str,
        domain: &DomainOverride,
    ) -> Result<(), Error> {
        self.client.update_item(id, domain).await
    }

    pub async fn delete_domain_override(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<DomainOverride>(id).await
    }

    pub async fn add_forward(&self, forward: &Forward) -> Result<String, Error> {
        self.client.add_item(forward).await
    }

    pub async fn get_forward(&self, id: &str) -> Result<Forward, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_forward(&self, id: &str, forward: &Forward) -> Result<(), Error> {
        self.client.update_item(id, forward).await
    }

    pub async fn delete_forward(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Forward>(id).await
    }
}
