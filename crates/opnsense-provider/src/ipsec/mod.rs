// IPsec resources: connections (phase 1), children (phase 2), local and
// remote authentication rounds, pre-shared keys and VTIs.
//
// Timers, rounds and request IDs stay strings: the appliance accepts
// empty values for most of them and reports them back verbatim.

pub mod auth;
pub mod child;
pub mod connection;
pub mod psk;
pub mod vti;

pub use auth::{Auth, AuthLocalResource, AuthRemoteResource};
pub use child::{Child, ChildResource};
pub use connection::{Connection, ConnectionResource};
pub use psk::{Psk, PskResource, PskType};
pub use vti::{Vti, VtiResource};
