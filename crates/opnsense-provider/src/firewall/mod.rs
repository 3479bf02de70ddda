// Firewall resources: aliases, categories, filter rules, source NAT and
// 1:1 NAT.

use serde::{Deserialize, Serialize};

use crate::convert::default_any;

pub mod alias;
pub mod category;
pub mod filter;
pub mod nat;
pub mod one_to_one;

pub use alias::{Alias, AliasResource};
pub use category::{Category, CategoryResource};
pub use filter::{Filter, FilterResource};
pub use nat::{Nat, NatResource};
pub use one_to_one::{NatOneToOne, NatOneToOneResource};

/// Source or destination match of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Address, CIDR, alias, `<int>` for an interface network or `<int>ip`
    /// for its address.
    #[serde(default = "default_any")]
    pub net: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub invert: bool,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            net: default_any(),
            port: String::new(),
            invert: false,
        }
    }
}
