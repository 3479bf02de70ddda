// ── Provider registry ──
//
// `OpnsenseProvider` owns the type registry and the configured client.
// It is cheap to clone; every request task holds its own handle. The
// client is swapped in atomically by `configure` so in-flight reads never
// observe a half-built connection.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use opnsense_api::Client;
use opnsense_config::ProviderConfig;

use crate::diag::Diagnostics;
use crate::diagnostics::{InterfaceAllDataSource, InterfaceDataSource};
use crate::firewall::{
    AliasResource, CategoryResource, FilterResource, NatOneToOneResource, NatResource,
};
use crate::handler::{ByIdDataSource, DataSource, Outcome, Resource, ResourceHandler};
use crate::interfaces::{VipResource, VlanResource};
use crate::ipsec::{
    AuthLocalResource, AuthRemoteResource, ChildResource, ConnectionResource, PskResource,
    VtiResource,
};
use crate::routes::RouteResource;
use crate::unbound::{
    DomainOverrideResource, ForwardResource, HostAliasResource, HostOverrideResource,
};
use crate::wireguard::{PeerResource, ServerResource};

/// Prefix shared by every resource and data source type name.
pub const TYPE_PREFIX: &str = "opnsense_";

const PROVIDER_DESCRIPTION: &str = "Manage OPNsense firewalls through the OPNsense API.";

// Each object type is both a resource and a by-ID data source.
macro_rules! crud_types {
    ($($crud:ty),+ $(,)?) => {
        fn crud_resources() -> Vec<Box<dyn Resource>> {
            vec![$(Box::new(ResourceHandler::<$crud>::new())),+]
        }

        fn crud_data_sources() -> Vec<Box<dyn DataSource>> {
            vec![$(Box::new(ByIdDataSource::<$crud>::new())),+]
        }
    };
}

crud_types!(
    AliasResource,
    CategoryResource,
    FilterResource,
    NatResource,
    NatOneToOneResource,
    VipResource,
    VlanResource,
    AuthLocalResource,
    AuthRemoteResource,
    ChildResource,
    ConnectionResource,
    PskResource,
    VtiResource,
    RouteResource,
    DomainOverrideResource,
    ForwardResource,
    HostAliasResource,
    HostOverrideResource,
    PeerResource,
    ServerResource,
);

// ── Schema listing ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub type_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSchema {
    pub provider: SchemaEntry,
    pub resources: Vec<SchemaEntry>,
    pub data_sources: Vec<SchemaEntry>,
}

// ── Provider ────────────────────────────────────────────────────────

struct ProviderInner {
    client: ArcSwapOption<Client>,
    resources: IndexMap<String, Box<dyn Resource>>,
    data_sources: IndexMap<String, Box<dyn DataSource>>,
    cancel: CancellationToken,
}

#[derive(Clone)]
pub struct OpnsenseProvider {
    inner: Arc<ProviderInner>,
}

impl Default for OpnsenseProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpnsenseProvider {
    /// Build the registry. No client exists until [`configure`](Self::configure).
    pub fn new() -> Self {
        let mut data_sources = crud_data_sources();
        data_sources.push(Box::new(InterfaceDataSource));
        data_sources.push(Box::new(InterfaceAllDataSource));

        let resources: IndexMap<_, _> = crud_resources()
            .into_iter()
            .map(|r| (format!("{TYPE_PREFIX}{}", r.type_name()), r))
            .collect();
        let data_sources: IndexMap<_, _> = data_sources
            .into_iter()
            .map(|d| (format!("{TYPE_PREFIX}{}", d.type_name()), d))
            .collect();
        debug!(
            resources = resources.len(),
            data_sources = data_sources.len(),
            "provider registry built"
        );

        Self {
            inner: Arc::new(ProviderInner {
                client: ArcSwapOption::empty(),
                resources,
                data_sources,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn schema(&self) -> ProviderSchema {
        let entry = |name: &String, description: &str| SchemaEntry {
            type_name: name.clone(),
            description: description.to_owned(),
        };
        ProviderSchema {
            provider: SchemaEntry {
                type_name: "opnsense".into(),
                description: PROVIDER_DESCRIPTION.into(),
            },
            resources: self
                .inner
                .resources
                .iter()
                .map(|(name, r)| entry(name, r.description()))
                .collect(),
            data_sources: self
                .inner
                .data_sources
                .iter()
                .map(|(name, d)| entry(name, d.description()))
                .collect(),
        }
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.inner.resources.keys().map(String::as_str)
    }

    pub fn data_source_names(&self) -> impl Iterator<Item = &str> {
        self.inner.data_sources.keys().map(String::as_str)
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Resolve the provider block against the environment and build the
    /// shared client. A failed configure leaves any earlier client in place.
    pub fn configure(&self, config: Value) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let config: ProviderConfig = if config.is_null() {
            ProviderConfig::default()
        } else {
            match serde_json::from_value(config) {
                Ok(config) => config,
                Err(e) => {
                    diags.add_error("Invalid Provider Configuration", e.to_string());
                    return diags;
                }
            }
        };

        let settings = match opnsense_config::resolve(&config) {
            Ok(settings) => settings,
            Err(e) => return Diagnostics::from(&e),
        };
        if settings.allow_insecure {
            warn!(uri = %settings.uri, "TLS certificate verification disabled");
            diags.add_warning(
                "Insecure Connection",
                "allow_insecure is set: the appliance's TLS certificate will not be verified.",
            );
        }

        match Client::new(settings.to_options()) {
            Ok(client) => {
                info!(uri = %settings.uri, "provider configured");
                self.inner.client.store(Some(Arc::new(client)));
            }
            Err(e) => diags.add_error(
                "Unable to Create API Client",
                format!("An unexpected error occurred when creating the OPNsense API client: {e}"),
            ),
        }
        diags
    }

    pub fn client(&self) -> Option<Arc<Client>> {
        self.inner.client.load_full()
    }

    /// Token cancelled by [`stop`](Self::stop).
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    pub fn stop(&self) {
        info!("provider stopping");
        self.inner.cancel.cancel();
    }

    fn configured(&self) -> Result<Arc<Client>, Diagnostics> {
        self.client().ok_or_else(|| {
            let mut diags = Diagnostics::new();
            diags.add_error(
                "Unconfigured provider",
                "Expected a configured OPNsense API client. Configure the provider before \
                 using its resources and data sources.",
            );
            diags
        })
    }

    fn resource(&self, type_name: &str) -> Result<&dyn Resource, Diagnostics> {
        self.inner
            .resources
            .get(type_name)
            .map(AsRef::as_ref)
            .ok_or_else(|| unknown_type("resource", type_name))
    }

    fn resource_with_client(
        &self,
        type_name: &str,
    ) -> Result<(&dyn Resource, Arc<Client>), Diagnostics> {
        let resource = self.resource(type_name)?;
        Ok((resource, self.configured()?))
    }

    fn data_source(&self, type_name: &str) -> Result<&dyn DataSource, Diagnostics> {
        self.inner
            .data_sources
            .get(type_name)
            .map(AsRef::as_ref)
            .ok_or_else(|| unknown_type("data source", type_name))
    }

    // ── Resource dispatch ───────────────────────────────────────────

    pub fn validate_resource(&self, type_name: &str, config: Value) -> Diagnostics {
        match self.resource(type_name) {
            Ok(resource) => resource.validate(config),
            Err(diags) => diags,
        }
    }

    pub async fn create_resource(&self, type_name: &str, plan: Value) -> Outcome {
        let (resource, client) = match self.resource_with_client(type_name) {
            Ok(found) => found,
            Err(diags) => return diags.into(),
        };
        resource.create(&client, plan).await
    }

    pub async fn read_resource(&self, type_name: &str, state: Value) -> Outcome {
        let (resource, client) = match self.resource_with_client(type_name) {
            Ok(found) => found,
            Err(diags) => return diags.into(),
        };
        resource.read(&client, state).await
    }

    pub async fn update_resource(&self, type_name: &str, plan: Value, prior: Value) -> Outcome {
        let (resource, client) = match self.resource_with_client(type_name) {
            Ok(found) => found,
            Err(diags) => return diags.into(),
        };
        resource.update(&client, plan, prior).await
    }

    pub async fn delete_resource(&self, type_name: &str, state: Value) -> Diagnostics {
        let (resource, client) = match self.resource_with_client(type_name) {
            Ok(found) => found,
            Err(diags) => return diags,
        };
        resource.delete(&client, state).await
    }

    /// Import only records the ID; the host follows up with a read.
    pub fn import_resource(&self, type_name: &str, id: &str) -> Outcome {
        match self.resource(type_name) {
            Ok(resource) => resource.import(id),
            Err(diags) => diags.into(),
        }
    }

    // ── Data source dispatch ────────────────────────────────────────

    pub fn validate_data_source(&self, type_name: &str, config: Value) -> Diagnostics {
        match self.data_source(type_name) {
            Ok(data_source) => data_source.validate(config),
            Err(diags) => diags,
        }
    }

    pub async fn read_data_source(&self, type_name: &str, config: Value) -> Outcome {
        let data_source = match self.data_source(type_name) {
            Ok(data_source) => data_source,
            Err(diags) => return diags.into(),
        };
        let client = match self.configured() {
            Ok(client) => client,
            Err(diags) => return diags.into(),
        };
        data_source.read(&client, config).await
    }
}

fn unknown_type(what: &str, type_name: &str) -> Diagnostics {
    let mut diags = Diagnostics::new();
    diags.add_error(
        format!("Unknown {what} type"),
        format!("The provider does not implement a {what} named \"{type_name}\""),
    );
    diags
}
