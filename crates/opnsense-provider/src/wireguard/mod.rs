// WireGuard resources: server instances and the client peers they accept.

pub mod client;
pub mod server;

pub use client::{Peer, PeerResource};
pub use server::{Server, ServerResource};
