// Unbound DNS resources: host overrides, their aliases, domain
// overrides and query forwarding servers.

pub mod domain_override;
pub mod forward;
pub mod host_alias;
pub mod host_override;

pub use domain_override::{DomainOverride, DomainOverrideResource};
pub use forward::{Forward, ForwardResource};
pub use host_alias::{HostAlias, HostAliasResource};
pub use host_override::{HostOverride, HostOverrideResource, RecordType};
