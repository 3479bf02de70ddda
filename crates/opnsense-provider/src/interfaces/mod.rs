// Interface resources: virtual IPs and VLANs.

pub mod vip;
pub mod vlan;

pub use vip::{Vip, VipMode, VipResource};
pub use vlan::{Vlan, VlanResource};
