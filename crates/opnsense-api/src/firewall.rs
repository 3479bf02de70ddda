// Firewall endpoints
//
// Aliases and categories live under `/firewall/{alias,category}/` and use
// the `*Item` verbs; filter, source NAT and 1:1 NAT rules use `*Rule` and
// are made live with an `apply` call instead of `reconfigure`.

use serde::{Deserialize, Serialize};

use crate::client::{Client, Controller, Endpoints, Item};
use crate::codec::{SelectedMap, SelectedMapList, SelectedMapListNl};
use crate::error::Error;

// ── Alias ────────────────────────────────────────────────────────────

/// Named list of hosts, networks or ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alias {
    pub enabled: String,
    pub name: String,
    #[serde(rename = "type")]
    pub alias_type: SelectedMap,
    #[serde(rename = "proto")]
    pub ip_protocol: SelectedMap,
    pub interface: SelectedMap,
    /// Newline-joined on the wire.
    pub content: SelectedMapListNl,
    pub categories: SelectedMapList,
    /// Days, as a decimal string. Empty when unset.
    #[serde(rename = "updatefreq")]
    pub update_freq: String,
    #[serde(rename = "counters")]
    pub statistics: String,
    pub description: String,
}

impl Item for Alias {
    const KIND: &'static str = "alias";
    const KEY: &'static str = "alias";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Firewall,
        add: "/firewall/alias/addItem",
        get: "/firewall/alias/getItem",
        set: "/firewall/alias/setItem",
        delete: "/firewall/alias/delItem",
        reconfigure: Some("/firewall/alias/reconfigure"),
    };
}

// ── Category ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    #[serde(rename = "auto")]
    pub automatic: String,
    pub name: String,
    pub color: String,
}

impl Item for Category {
    const KIND: &'static str = "category";
    const KEY: &'static str = "category";
    // Categories take effect on save.
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Firewall,
        add: "/firewall/category/addItem",
        get: "/firewall/category/getItem",
        set: "/firewall/category/setItem",
        delete: "/firewall/category/delItem",
        reconfigure: None,
    };
}

// ── Filter rule ──────────────────────────────────────────────────────

/// Automation filter rule. Integer fields are decimal strings, empty
/// when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub enabled: String,
    pub sequence: String,
    #[serde(rename = "nosync")]
    pub no_xmlrpc_sync: String,
    pub description: String,
    pub categories: SelectedMapList,

    #[serde(rename = "interfacenot")]
    pub invert_interface: String,
    pub interface: SelectedMapList,

    pub quick: String,
    pub action: SelectedMap,
    #[serde(rename = "allowopts")]
    pub allow_options: String,
    pub direction: SelectedMap,
    #[serde(rename = "ipprotocol")]
    pub ip_protocol: SelectedMap,
    pub protocol: SelectedMap,
    #[serde(rename = "icmptype")]
    pub icmp_type: SelectedMapList,
    pub source_net: String,
    pub source_port: String,
    #[serde(rename = "source_not")]
    pub source_invert: String,
    pub destination_net: String,
    pub destination_port: String,
    #[serde(rename = "destination_not")]
    pub destination_invert: String,
    pub log: String,
    #[serde(rename = "tcpflags1")]
    pub tcp_flags: SelectedMapList,
    #[serde(rename = "tcpflags2")]
    pub tcp_flags_out_of: SelectedMapList,
    #[serde(rename = "sched")]
    pub schedule: SelectedMap,

    #[serde(rename = "statetype")]
    pub state_type: SelectedMap,
    #[serde(rename = "state-policy")]
    pub state_policy: SelectedMap,
    #[serde(rename = "statetimeout")]
    pub state_timeout: String,
    #[serde(rename = "adaptivestart")]
    pub adaptive_timeouts_start: String,
    #[serde(rename = "adaptiveend")]
    pub adaptive_timeouts_end: String,
    #[serde(rename = "max")]
    pub max_states: String,
    #[serde(rename = "max-src-nodes")]
    pub max_source_nodes: String,
    #[serde(rename = "max-src-states")]
    pub max_source_states: String,
    #[serde(rename = "max-src-conn")]
    pub max_source_connections: String,
    #[serde(rename = "max-src-conn-rate")]
    pub max_new_connections_count: String,
    #[serde(rename = "max-src-conn-rates")]
    pub max_new_connections_seconds: String,
    #[serde(rename = "overload")]
    pub overload_table: SelectedMap,
    #[serde(rename = "nopfsync")]
    pub no_pfsync: String,

    #[serde(rename = "shaper1")]
    pub traffic_shaper: SelectedMap,
    #[serde(rename = "shaper2")]
    pub traffic_shaper_reverse: SelectedMap,

    pub gateway: SelectedMap,
    #[serde(rename = "disablereplyto")]
    pub disable_reply_to: String,
    #[serde(rename = "replyto")]
    pub reply_to: SelectedMap,

    #[serde(rename = "prio")]
    pub match_priority: SelectedMap,
    #[serde(rename = "set-prio")]
    pub set_priority: SelectedMap,
    #[serde(rename = "set-prio-low")]
    pub set_priority_low_delay: SelectedMap,
    #[serde(rename = "tos")]
    pub match_tos: SelectedMap,

    #[serde(rename = "tag")]
    pub set_local_tag: String,
    #[serde(rename = "tagged")]
    pub match_local_tag: String,
}

impl Item for Filter {
    const KIND: &'static str = "filter rule";
    const KEY: &'static str = "rule";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Firewall,
        add: "/firewall/filter/addRule",
        get: "/firewall/filter/getRule",
        set: "/firewall/filter/setRule",
        delete: "/firewall/filter/delRule",
        reconfigure: Some("/firewall/filter/apply"),
    };
}

// ── Source NAT rule ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nat {
    pub enabled: String,
    #[serde(rename = "nonat")]
    pub disable_nat: String,
    pub sequence: String,
    pub interface: SelectedMap,
    #[serde(rename = "ipprotocol")]
    pub ip_protocol: SelectedMap,
    pub protocol: SelectedMap,
    pub source_net: String,
    pub source_port: String,
    #[serde(rename = "source_not")]
    pub source_invert: String,
    pub destination_net: String,
    pub destination_port: String,
    #[serde(rename = "destination_not")]
    pub destination_invert: String,
    pub target: String,
    pub target_port: String,
    pub log: String,
    pub description: String,
}

impl Item for Nat {
    const KIND: &'static str = "NAT rule";
    const KEY: &'static str = "rule";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Firewall,
        add: "/firewall/source_nat/addRule",
        get: "/firewall/source_nat/getRule",
        set: "/firewall/source_nat/setRule",
        delete: "/firewall/source_nat/delRule",
        reconfigure: Some("/firewall/source_nat/apply"),
    };
}

// ── 1:1 NAT rule ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatOneToOne {
    pub enabled: String,
    pub log: String,
    pub sequence: String,
    pub interface: SelectedMap,
    #[serde(rename = "type")]
    pub nat_type: SelectedMap,
    pub source_net: String,
    #[serde(rename = "source_not")]
    pub source_invert: String,
    pub destination_net: String,
    #[serde(rename = "destination_not")]
    pub destination_invert: String,
    #[serde(rename = "external")]
    pub external_net: String,
    /// `""` means "use the system default".
    #[serde(rename = "natreflection")]
    pub nat_reflection: SelectedMap,
    pub categories: SelectedMapList,
    pub description: String,
}

impl Item for NatOneToOne {
    const KIND: &'static str = "1:1 NAT rule";
    const KEY: &'static str = "rule";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Firewall,
        add: "/firewall/one_to_one/addRule",
        get: "/firewall/one_to_one/getRule",
        set: "/firewall/one_to_one/setRule",
        delete: "/firewall/one_to_one/delRule",
        reconfigure: Some("/firewall/one_to_one/apply"),
    };
}

// ── Accessor ─────────────────────────────────────────────────────────

/// Firewall endpoint group, returned by [`Client::firewall`].
#[derive(Debug, Clone, Copy)]
pub struct Firewall<'a> {
    client: &'a Client,
}

impl<'a> Firewall<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `POST /firewall/alias/addItem`
    pub async fn add_alias(&self, alias: &Alias) -> Result<String, Error> {
        self.client.add_item(alias).await
    }

    /// `GET /firewall/alias/getItem/{id}`
    pub async fn get_alias(&self, id: &str) -> Result<Alias, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_alias(&self, id: &str, alias: &Alias) -> Result<(), Error> {
        self.client.update_item(id, alias).await
    }

    pub async fn delete_alias(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Alias>(id).await
    }

    pub async fn add_category(&self, category: &Category) -> Result<String, Error> {
        self.client.add_item(category).await
    }

    pub async fn get_category(&self, id: &str) -> Result<Category, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_category(&self, id: &str, category: &Category) -> Result<(), Error> {
        self.client.update_item(id, category).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Category>(id).await
    }

    /// `POST /firewall/filter/addRule`, then `/firewall/filter/apply`.
    pub async fn add_filter(&self, filter: &Filter) -> Result<String, Error> {
        self.client.add_item(filter).await
    }

    pub async fn get_filter(&self, id: &str) -> Result<Filter, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_filter(&self, id: &str, filter: &Filter) -> Result<(), Error> {
        self.client.update_item(id, filter).await
    }

    pub async fn delete_filter(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Filter>(id).await
    }

    pub async fn add_nat(&self, nat: &Nat) -> Result<String, Error> {
        self.client.add_item(nat).await
    }

    pub async fn get_nat(&self, id: &str) -> Result<Nat, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_nat(&self, id: &str, nat: &Nat) -> Result<(), Error> {
        self.client.update_item(id, nat).await
    }

    pub async fn delete_nat(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Nat>(id).await
    }

    pub async fn add_nat_one_to_one(&self, rule: &NatOneToOne) -> Result<String, Error> {
        self.client.add_item(rule).await
    }

    pub async fn get_nat_one_to_one(&self, id: &str) -> Result<NatOneToOne, Error> {
        self.client.get_item(id).await
    }

    pub async fn update_nat_one_to_one(&self, id: &str, rule: &NatOneToOne) -> Result<(), Error> {
        self.client.update_item(id, rule).await
    }

    pub async fn delete_nat_one_to_one(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<NatOneToOne>(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn filter_decodes_option_maps() {
        let raw = json!({
            "enabled": "1",
            "sequence": "10",
            "interface": {
                "lan": { "value": "LAN", "selected": 1 },
                "wan": { "value": "WAN", "selected": 1 },
                "opt1": { "value": "DMZ", "selected": 0 }
            },
            "action": {
                "pass": { "value": "Pass", "selected": 1 },
                "block": { "value": "Block", "selected": 0 }
            },
            "max-src-conn-rate": "",
            "state-policy": { "": { "value": "default", "selected": 1 } },
            "tos": { "": { "value": "any", "selected": 1 }, "0x10": { "value": "0x10", "selected": 0 } }
        });
        let filter: Filter = serde_json::from_value(raw).unwrap();
        assert_eq!(filter.interface.as_slice(), ["lan", "wan"]);
        assert_eq!(filter.action.as_str(), "pass");
        assert_eq!(filter.sequence, "10");
        assert!(filter.state_policy.is_empty());
        assert!(filter.match_tos.is_empty());
    }

    #[test]
    fn filter_encodes_wire_names() {
        let filter = Filter {
            max_new_connections_count: "5".into(),
            state_policy: SelectedMap::from("floating"),
            interface: SelectedMapList::from(vec!["lan".to_owned(), "wan".to_owned()]),
            ..Filter::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value["max-src-conn-rate"], json!("5"));
        assert_eq!(value["state-policy"], json!("floating"));
        assert_eq!(value["interface"], json!("lan,wan"));
    }

    #[test]
    fn alias_content_is_newline_joined() {
        let alias = Alias {
            content: SelectedMapListNl::from(vec!["10.0.0.0/8".to_owned(), "192.168.0.0/16".to_owned()]),
            ..Alias::default()
        };
        let value = serde_json::to_value(&alias).unwrap();
        assert_eq!(value["content"], json!("10.0.0.0/8\n192.168.0.0/16"));
        assert_eq!(value["type"], json!(""));
    }
}
