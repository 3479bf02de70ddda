//! Resources, data sources and the plugin server for the OPNsense
//! Terraform provider.
//!
//! - **[`OpnsenseProvider`]**: type registry and configured API client.
//!   Every `opnsense_*` resource and data source is dispatched through it.
//!
//! - **[`handler`]**: the `Crud` description each object type implements,
//!   and the generic [`ResourceHandler`] / [`ByIdDataSource`] that turn it
//!   into the create/read/update/delete/import lifecycle.
//!
//! - **[`server`]**: newline-delimited JSON request loop spoken with the
//!   host process.
//!
//! - Object types live in [`firewall`], [`interfaces`], [`ipsec`],
//!   [`routes`], [`unbound`] and [`wireguard`]; [`diagnostics`] holds the
//!   read-only interface data sources.
//!
//! Nothing here returns errors to the host. Failures travel back as
//! [`Diagnostics`] alongside whatever state was produced.

pub mod convert;
pub mod diag;
pub mod diagnostics;
pub mod firewall;
pub mod handler;
pub mod interfaces;
pub mod ipsec;
pub mod provider;
pub mod routes;
pub mod server;
pub mod unbound;
pub mod validate;
pub mod wireguard;

// ── Primary re-exports ──────────────────────────────────────────────
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use handler::{ByIdDataSource, Crud, DataSource, Outcome, Resource, ResourceHandler, State};
pub use provider::{OpnsenseProvider, ProviderSchema, SchemaEntry, TYPE_PREFIX};
pub use server::serve;
