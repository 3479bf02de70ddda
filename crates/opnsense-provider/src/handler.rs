// ── Resource and data-source handlers ──
//
// Every object type is described once by a `Crud` impl: its model, its
// wire struct, the converters between them, and the four client calls.
// `ResourceHandler` and `ByIdDataSource` turn that description into the
// object-safe `Resource`/`DataSource` traits the registry dispatches on.
//
// Converters never see the ID. It lives next to the model in `State` and
// is reattached by the handler after every conversion.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use opnsense_api::{Client, Error};

use crate::convert::ConvertError;
use crate::diag::Diagnostics;
use crate::validate::{self, INVALID_ATTRIBUTE, Validate};

// ── Crud description ────────────────────────────────────────────────

#[async_trait]
pub trait Crud: Send + Sync + 'static {
    /// Type name without the provider prefix, e.g. `firewall_alias`.
    const TYPE_NAME: &'static str;
    const DESCRIPTION: &'static str;
    /// Noun used in diagnostics ("Unable to create <kind>").
    const KIND: &'static str;

    type Model: Serialize + DeserializeOwned + Validate + Send + Sync;
    type Wire: Send + Sync;

    fn to_wire(model: &Self::Model) -> Self::Wire;
    fn from_wire(wire: Self::Wire) -> Result<Self::Model, ConvertError>;

    async fn add(client: &Client, wire: &Self::Wire) -> Result<String, Error>;
    async fn get(client: &Client, id: &str) -> Result<Self::Wire, Error>;
    async fn update(client: &Client, id: &str, wire: &Self::Wire) -> Result<(), Error>;
    async fn delete(client: &Client, id: &str) -> Result<(), Error>;

    /// Whether create reads the object back to pick up attributes the
    /// appliance assigns.
    const READ_AFTER_CREATE: bool = false;

    /// Copy appliance-assigned attributes from `known` (the object as
    /// read back after create, or the prior state on update) into a plan.
    fn carry_assigned(planned: Self::Model, known: &Self::Model) -> Self::Model {
        let _ = known;
        planned
    }

    /// Adjust a freshly read model against the prior state. `prior` is
    /// `None` right after an import.
    fn refresh(prior: Option<&Self::Model>, fresh: Self::Model) -> Self::Model {
        let _ = prior;
        fresh
    }
}

/// Model plus the appliance-assigned ID, as stored in state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State<M> {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub model: M,
}

impl<M: Validate> Validate for State<M> {
    fn validate(&self, diags: &mut Diagnostics) {
        self.model.validate(diags);
    }
}

/// State (if any) and diagnostics produced by one handler call.
#[derive(Debug, Default)]
pub struct Outcome {
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    pub fn with_state<T: Serialize>(state: &T, mut diagnostics: Diagnostics) -> Self {
        match serde_json::to_value(state) {
            Ok(value) => Self {
                state: Some(value),
                diagnostics,
            },
            Err(e) => {
                diagnostics.add_error("Serialization Error", e.to_string());
                Self {
                    state: None,
                    diagnostics,
                }
            }
        }
    }
}

impl From<Diagnostics> for Outcome {
    fn from(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }
}

// ── Object-safe handler traits ──────────────────────────────────────

#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn validate(&self, config: Value) -> Diagnostics;
    async fn create(&self, client: &Client, plan: Value) -> Outcome;
    async fn read(&self, client: &Client, state: Value) -> Outcome;
    async fn update(&self, client: &Client, plan: Value, prior: Value) -> Outcome;
    async fn delete(&self, client: &Client, state: Value) -> Diagnostics;
    fn import(&self, id: &str) -> Outcome;
}

#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn validate(&self, config: Value) -> Diagnostics;
    async fn read(&self, client: &Client, config: Value) -> Outcome;
}

fn state_id(state: &Value) -> Option<String> {
    state
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

fn missing_id(type_name: &str) -> Diagnostics {
    let mut diags = Diagnostics::new();
    diags.add_attribute_error(
        "id",
        "Missing Resource ID",
        format!("{type_name} state has no id; the resource cannot be located"),
    );
    diags
}

fn conversion_error(kind: &str, err: &ConvertError) -> Diagnostics {
    let mut diags = Diagnostics::new();
    diags.add_error(
        "Conversion Error",
        format!("Unable to convert {kind} from the API response: {err}"),
    );
    diags
}

// ── Resource handler ────────────────────────────────────────────────

pub struct ResourceHandler<C>(PhantomData<C>);

impl<C: Crud> ResourceHandler<C> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    async fn fetch(client: &Client, id: &str) -> Result<C::Model, Diagnostics> {
        let wire = C::get(client, id).await.map_err(|err| {
            let mut diags = Diagnostics::new();
            diags.add_client_error("read", C::KIND, &err);
            diags
        })?;
        C::from_wire(wire).map_err(|err| conversion_error(C::KIND, &err))
    }
}

impl<C: Crud> Default for ResourceHandler<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Crud> Resource for ResourceHandler<C> {
    fn type_name(&self) -> &'static str {
        C::TYPE_NAME
    }

    fn description(&self) -> &'static str {
        C::DESCRIPTION
    }

    fn validate(&self, config: Value) -> Diagnostics {
        validate::decode::<State<C::Model>>(config)
            .err()
            .unwrap_or_default()
    }

    async fn create(&self, client: &Client, plan: Value) -> Outcome {
        let plan: State<C::Model> = match validate::decode(plan) {
            Ok(plan) => plan,
            Err(diags) => return diags.into(),
        };

        let wire = C::to_wire(&plan.model);
        match C::add(client, &wire).await {
            Ok(id) => {
                info!(type_name = C::TYPE_NAME, %id, "created");
                let mut model = plan.model;
                let mut diags = Diagnostics::new();
                if C::READ_AFTER_CREATE {
                    match Self::fetch(client, &id).await {
                        Ok(created) => model = C::carry_assigned(model, &created),
                        Err(read_diags) => diags = read_diags,
                    }
                }
                Outcome::with_state(&State { id, model }, diags)
            }
            Err(err) => {
                let mut diags = Diagnostics::new();
                diags.add_client_error("create", C::KIND, &err);
                // Keep the allocated ID so a later destroy can clean up.
                match err.created_id() {
                    Some(id) => {
                        warn!(type_name = C::TYPE_NAME, id, error = %err, "partially created");
                        let state = State {
                            id: id.to_owned(),
                            model: plan.model,
                        };
                        Outcome::with_state(&state, diags)
                    }
                    None => diags.into(),
                }
            }
        }
    }

    async fn read(&self, client: &Client, state: Value) -> Outcome {
        let Some(id) = state_id(&state) else {
            return missing_id(C::TYPE_NAME).into();
        };
        let prior = serde_json::from_value::<C::Model>(state.clone()).ok();

        let wire = match C::get(client, &id).await {
            Ok(wire) => wire,
            Err(err) if err.is_not_found() => {
                debug!(type_name = C::TYPE_NAME, %id, "not found upstream, removing from state");
                return Outcome::default();
            }
            Err(err) => {
                let mut diags = Diagnostics::new();
                diags.add_client_error("read", C::KIND, &err);
                return Outcome {
                    state: Some(state),
                    diagnostics: diags,
                };
            }
        };

        match C::from_wire(wire) {
            Ok(fresh) => {
                let state = State {
                    id,
                    model: C::refresh(prior.as_ref(), fresh),
                };
                Outcome::with_state(&state, Diagnostics::new())
            }
            Err(err) => Outcome {
                state: Some(state),
                diagnostics: conversion_error(C::KIND, &err),
            },
        }
    }

    async fn update(&self, client: &Client, plan: Value, prior: Value) -> Outcome {
        let mut plan: State<C::Model> = match validate::decode(plan) {
            Ok(plan) => plan,
            Err(diags) => return diags.into(),
        };
        if plan.id.is_empty() {
            match state_id(&prior) {
                Some(id) => plan.id = id,
                None => return missing_id(C::TYPE_NAME).into(),
            }
        }

        if let Ok(known) = serde_json::from_value::<C::Model>(prior.clone()) {
            plan.model = C::carry_assigned(plan.model, &known);
        }

        let wire = C::to_wire(&plan.model);
        match C::update(client, &plan.id, &wire).await {
            Ok(()) => {
                info!(type_name = C::TYPE_NAME, id = %plan.id, "updated");
                Outcome::with_state(&plan, Diagnostics::new())
            }
            Err(err) => {
                let mut diags = Diagnostics::new();
                diags.add_client_error("update", C::KIND, &err);
                Outcome {
                    state: Some(prior),
                    diagnostics: diags,
                }
            }
        }
    }

    async fn delete(&self, client: &Client, state: Value) -> Diagnostics {
        let Some(id) = state_id(&state) else {
            return missing_id(C::TYPE_NAME);
        };
        let mut diags = Diagnostics::new();
        match C::delete(client, &id).await {
            Ok(()) => info!(type_name = C::TYPE_NAME, %id, "deleted"),
            Err(err) => diags.add_client_error("delete", C::KIND, &err),
        }
        diags
    }

    fn import(&self, id: &str) -> Outcome {
        Outcome::with_state(&serde_json::json!({ "id": id }), Diagnostics::new())
    }
}

// ── By-ID data source ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct IdConfig {
    id: String,
}

impl Validate for IdConfig {
    fn validate(&self, diags: &mut Diagnostics) {
        if self.id.is_empty() {
            diags.add_attribute_error("id", INVALID_ATTRIBUTE, "Attribute id must not be empty");
        }
    }
}

/// Data source that looks one object up by ID and reports every
/// attribute of its resource counterpart.
pub struct ByIdDataSource<C>(PhantomData<C>);

impl<C: Crud> ByIdDataSource<C> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C: Crud> Default for ByIdDataSource<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Crud> DataSource for ByIdDataSource<C> {
    fn type_name(&self) -> &'static str {
        C::TYPE_NAME
    }

    fn description(&self) -> &'static str {
        C::DESCRIPTION
    }

    fn validate(&self, config: Value) -> Diagnostics {
        validate::decode::<IdConfig>(config).err().unwrap_or_default()
    }

    async fn read(&self, client: &Client, config: Value) -> Outcome {
        let config: IdConfig = match validate::decode(config) {
            Ok(config) => config,
            Err(diags) => return diags.into(),
        };

        let wire = match C::get(client, &config.id).await {
            Ok(wire) => wire,
            Err(err) => {
                let mut diags = Diagnostics::new();
                diags.add_client_error("read", C::KIND, &err);
                return diags.into();
            }
        };
        match C::from_wire(wire) {
            Ok(model) => {
                let state = State {
                    id: config.id,
                    model,
                };
                Outcome::with_state(&state, Diagnostics::new())
            }
            Err(err) => conversion_error(C::KIND, &err).into(),
        }
    }
}
