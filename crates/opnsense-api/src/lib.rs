// opnsense-api: Async Rust client for the OPNsense REST API

pub mod client;
pub mod codec;
pub mod diagnostics;
pub mod error;
pub mod firewall;
pub mod interfaces;
pub mod ipsec;
pub mod retry;
pub mod routes;
pub mod transport;
pub mod unbound;
pub mod wireguard;

pub use client::{Client, Controller, Endpoints, Item, Options};
pub use codec::{SelectedMap, SelectedMapList, SelectedMapListNl};
pub use error::Error;
pub use retry::RetryPolicy;
pub use transport::{TlsMode, TransportConfig};
