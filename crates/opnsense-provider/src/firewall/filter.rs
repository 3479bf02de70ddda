// `opnsense_firewall_filter`: firewall filter rules.
//
// The model groups the rule's flat wire fields into blocks the same way
// the appliance's rule editor does: interface, filter, stateful
// firewall, traffic shaping, source routing, priority and internal
// tagging. Only `interface` and `filter` are required.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::firewall as api;
use opnsense_api::{Client, Error, SelectedMap};

use super::Location;
use crate::convert::{
    ConvertError, bool_to_wire, default_sequence, default_true, int_to_wire, opt_int_to_wire,
    parse_enum, set_to_wire, string_or_none, unset_int, wire_to_bool, wire_to_opt_int,
    wire_to_set,
};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{
    INVALID_ATTRIBUTE, Validate, check_min_items, check_one_of, check_range, check_uuid_v4,
};

pub const PROTOCOLS: &[&str] = &[
    "3PC", "A/N", "AH", "ARGUS", "ARIS", "AX.25", "BBN-RCC", "BNA", "BR-SAT-MON", "CARP", "CBT",
    "CFTP", "CHAOS", "COMPAQ-PEER", "CPHB", "CPNX", "CRTP", "CRUDP", "DCCP", "DCN", "DDP", "DDX",
    "DGP", "DIVERT", "DSR", "EGP", "EIGRP", "EMCON", "ENCAP", "ESP", "ETHERIP", "FC", "GGP",
    "GMTP", "GRE", "HIP", "HMP", "I-NLSP", "IATP", "ICMP", "IDPR", "IDPR-CMTP", "IDRP", "IFMP",
    "IGMP", "IGP", "IL", "IPCOMP", "IPCV", "IPENCAP", "IPIP", "IPPC", "IPV6", "IPV6-ICMP",
    "IPX-IN-IP", "IRTP", "ISIS", "ISO-IP", "ISO-TP4", "KRYPTOLAN", "L2TP", "LARP", "LEAF-1",
    "LEAF-2", "MANET", "MERIT-INP", "MFE-NSP", "MICP", "MOBILE", "MPLS-IN-IP", "MTP", "MUX",
    "NARP", "NETBLT", "NSFNET-IGP", "NVP", "OSPF", "PFSYNC", "PGM", "PIM", "PIPE", "PNNI", "PRM",
    "PTP", "PUP", "PVP", "QNX", "RDP", "ROHC", "RSVP", "RSVP-E2E-IGNORE", "RVD", "SAT-EXPAK",
    "SAT-MON", "SCC-SP", "SCPS", "SCTP", "SDRP", "SECURE-VMTP", "SHIM6", "SKIP", "SM", "SMP",
    "SNP", "SPRITE-RPC", "SPS", "SRP", "ST2", "STP", "SUN-ND", "SWIPE", "TCF", "TCP", "TCP/UDP",
    "TLSP", "TP++", "TRUNK-1", "TRUNK-2", "TTP", "UDP", "UDPLITE", "UTI", "VINES", "VISA", "VMTP",
    "WB-EXPAK", "WB-MON", "WESP", "WSN", "XNET", "XNS-IDP", "XTP", "any",
];

pub const ICMP_TYPES: &[&str] = &[
    "althost", "echorep", "echoreq", "inforep", "inforeq", "maskrep", "maskreq", "paramprob",
    "redir", "routeradv", "routersol", "squench", "timerep", "timereq", "timex", "unreach",
];

const TOS_NAMES: &[&str] = &[
    "af11", "af12", "af13", "af21", "af22", "af23", "af31", "af32", "af33", "af41", "af42", "af43",
    "critical", "cs0", "cs1", "cs2", "cs3", "cs4", "cs5", "cs6", "cs7", "ef", "inetcontrol",
    "lowdelay", "netcontrol", "reliability", "throughput",
];

// ── Enumerations ────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Pass,
    Block,
    Reject,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FilterIpProtocol {
    #[default]
    Inet,
    Inet6,
    Inet46,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StateType {
    #[default]
    Keep,
    Modulate,
    None,
    Sloppy,
    Synproxy,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StatePolicy {
    /// Use the system-wide state policy.
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    Default,
    Floating,
    IfBound,
}

// ── Blocks ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceBlock {
    /// Match every interface except the listed ones.
    #[serde(default)]
    pub invert: bool,
    pub interface: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterBlock {
    #[serde(default = "default_true")]
    pub quick: bool,
    pub action: Action,
    #[serde(default)]
    pub allow_options: bool,
    pub direction: Direction,
    #[serde(default)]
    pub ip_protocol: FilterIpProtocol,
    pub protocol: String,
    #[serde(default)]
    pub icmp_type: BTreeSet<String>,
    #[serde(default)]
    pub source: Location,
    #[serde(default)]
    pub destination: Location,
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub tcp_flags: BTreeSet<String>,
    #[serde(default)]
    pub tcp_flags_out_of: BTreeSet<String>,
    #[serde(default)]
    pub schedule: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveTimeouts {
    #[serde(deserialize_with = "unset_int")]
    pub start: Option<i64>,
    #[serde(deserialize_with = "unset_int")]
    pub end: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewConnections {
    #[serde(deserialize_with = "unset_int")]
    pub count: Option<i64>,
    #[serde(deserialize_with = "unset_int")]
    pub seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Max {
    #[serde(deserialize_with = "unset_int")]
    pub states: Option<i64>,
    #[serde(deserialize_with = "unset_int")]
    pub source_nodes: Option<i64>,
    #[serde(deserialize_with = "unset_int")]
    pub source_states: Option<i64>,
    #[serde(deserialize_with = "unset_int")]
    pub source_connections: Option<i64>,
    pub new_connections: NewConnections,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatefulFirewall {
    #[serde(rename = "type")]
    pub state_type: StateType,
    pub policy: StatePolicy,
    /// State timeout in seconds (TCP only).
    #[serde(deserialize_with = "unset_int")]
    pub timeout: Option<i64>,
    pub adaptive_timeouts: AdaptiveTimeouts,
    pub max: Max,
    pub overload_table: String,
    pub no_pfsync: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficShaping {
    /// Pipe or queue UUID, rule direction.
    pub shaper: String,
    pub reverse_shaper: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceRouting {
    pub gateway: String,
    pub disable_reply_to: bool,
    pub reply_to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Priority {
    #[serde(rename = "match", deserialize_with = "unset_int")]
    pub match_priority: Option<i64>,
    #[serde(rename = "set", deserialize_with = "unset_int")]
    pub set_priority: Option<i64>,
    #[serde(deserialize_with = "unset_int")]
    pub low_delay_set: Option<i64>,
    pub match_tos: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalTagging {
    pub set_local: String,
    pub match_local: String,
}

// ── Rule ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    /// Exclude the rule from HA synchronisation.
    #[serde(default)]
    pub no_xmlrpc_sync: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,

    pub interface: InterfaceBlock,
    pub filter: FilterBlock,
    #[serde(default)]
    pub stateful_firewall: StatefulFirewall,
    #[serde(default)]
    pub traffic_shaping: TrafficShaping,
    #[serde(default)]
    pub source_routing: SourceRouting,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub internal_tagging: InternalTagging,
}

/// `""`, a hex byte without zero padding (`0x0`..`0xff`) or a DSCP/TOS
/// keyword.
fn is_tos(value: &str) -> bool {
    if value.is_empty() || TOS_NAMES.contains(&value) {
        return true;
    }
    let Some(hex) = value.strip_prefix("0x") else {
        return false;
    };
    let canonical = (1..=2).contains(&hex.len())
        && !(hex.len() == 2 && hex.starts_with('0'))
        && hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    canonical && u8::from_str_radix(hex, 16).is_ok()
}

impl Validate for Filter {
    fn validate(&self, diags: &mut Diagnostics) {
        for category in &self.categories {
            check_uuid_v4(diags, "categories", category);
        }
        check_min_items(diags, "interface.interface", self.interface.interface.len(), 1);

        let filter = &self.filter;
        check_one_of(diags, "filter.protocol", &filter.protocol, PROTOCOLS);
        for icmp in &filter.icmp_type {
            check_one_of(diags, "filter.icmp_type", icmp, ICMP_TYPES);
        }
        if !filter.icmp_type.is_empty() && filter.protocol != "ICMP" {
            diags.add_attribute_error(
                "filter.icmp_type",
                INVALID_ATTRIBUTE,
                format!(
                    "Attribute filter.icmp_type requires filter.protocol to be \"ICMP\", got: \"{}\"",
                    filter.protocol
                ),
            );
        }

        let stateful = &self.stateful_firewall;
        let adaptive = &stateful.adaptive_timeouts;
        if let (Some(start), Some(end)) = (adaptive.start, adaptive.end) {
            if end < start {
                diags.add_attribute_error(
                    "stateful_firewall.adaptive_timeouts.end",
                    INVALID_ATTRIBUTE,
                    format!(
                        "Attribute stateful_firewall.adaptive_timeouts.end must be greater than or equal to stateful_firewall.adaptive_timeouts.start ({start}), got: {end}"
                    ),
                );
            }
        }
        if let (Some(states), Some(end)) = (stateful.max.states, adaptive.end) {
            if end < states {
                diags.add_attribute_error(
                    "stateful_firewall.adaptive_timeouts.end",
                    INVALID_ATTRIBUTE,
                    format!(
                        "Attribute stateful_firewall.adaptive_timeouts.end must be greater than or equal to stateful_firewall.max.states ({states}), got: {end}"
                    ),
                );
            }
        }
        if stateful.max.states.is_some() && !matches!(filter.protocol.as_str(), "TCP" | "TCP/UDP") {
            diags.add_attribute_error(
                "stateful_firewall.max.states",
                INVALID_ATTRIBUTE,
                format!(
                    "Attribute stateful_firewall.max.states requires filter.protocol to be one of [\"TCP\" \"TCP/UDP\"], got: \"{}\"",
                    filter.protocol
                ),
            );
        }

        check_uuid_v4(diags, "traffic_shaping.shaper", &self.traffic_shaping.shaper);
        check_uuid_v4(
            diags,
            "traffic_shaping.reverse_shaper",
            &self.traffic_shaping.reverse_shaper,
        );

        let priority = &self.priority;
        for (attribute, value) in [
            ("priority.match", priority.match_priority),
            ("priority.set", priority.set_priority),
            ("priority.low_delay_set", priority.low_delay_set),
        ] {
            if let Some(value) = value {
                check_range(diags, attribute, value, 0..=7);
            }
        }
        if !is_tos(&priority.match_tos) {
            diags.add_attribute_error(
                "priority.match_tos",
                INVALID_ATTRIBUTE,
                format!(
                    "Attribute priority.match_tos must be a TOS value (0x0-0xff) or DSCP name, got: \"{}\"",
                    priority.match_tos
                ),
            );
        }
    }
}

// ── Resource ────────────────────────────────────────────────────────

pub struct FilterResource;

#[async_trait]
impl Crud for FilterResource {
    const TYPE_NAME: &'static str = "firewall_filter";
    const DESCRIPTION: &'static str = "Firewall filter rules can be used to restrict or allow traffic from and/or to specific networks as well as influence how traffic should be forwarded";
    const KIND: &'static str = "firewall filter rule";

    type Model = Filter;
    type Wire = api::Filter;

    fn to_wire(model: &Filter) -> api::Filter {
        let filter = &model.filter;
        let stateful = &model.stateful_firewall;
        let priority = &model.priority;
        api::Filter {
            enabled: bool_to_wire(model.enabled),
            sequence: int_to_wire(model.sequence),
            no_xmlrpc_sync: bool_to_wire(model.no_xmlrpc_sync),
            description: model.description.clone().unwrap_or_default(),
            categories: set_to_wire(&model.categories),

            invert_interface: bool_to_wire(model.interface.invert),
            interface: set_to_wire(&model.interface.interface),

            quick: bool_to_wire(filter.quick),
            action: SelectedMap::from(filter.action.as_ref()),
            allow_options: bool_to_wire(filter.allow_options),
            direction: SelectedMap::from(filter.direction.as_ref()),
            ip_protocol: SelectedMap::from(filter.ip_protocol.as_ref()),
            protocol: SelectedMap::from(filter.protocol.as_str()),
            icmp_type: set_to_wire(&filter.icmp_type),
            source_net: filter.source.net.clone(),
            source_port: filter.source.port.clone(),
            source_invert: bool_to_wire(filter.source.invert),
            destination_net: filter.destination.net.clone(),
            destination_port: filter.destination.port.clone(),
            destination_invert: bool_to_wire(filter.destination.invert),
            log: bool_to_wire(filter.log),
            tcp_flags: set_to_wire(&filter.tcp_flags),
            tcp_flags_out_of: set_to_wire(&filter.tcp_flags_out_of),
            schedule: SelectedMap::from(filter.schedule.as_str()),

            state_type: SelectedMap::from(stateful.state_type.as_ref()),
            state_policy: SelectedMap::from(stateful.policy.as_ref()),
            state_timeout: opt_int_to_wire(stateful.timeout),
            adaptive_timeouts_start: opt_int_to_wire(stateful.adaptive_timeouts.start),
            adaptive_timeouts_end: opt_int_to_wire(stateful.adaptive_timeouts.end),
            max_states: opt_int_to_wire(stateful.max.states),
            max_source_nodes: opt_int_to_wire(stateful.max.source_nodes),
            max_source_states: opt_int_to_wire(stateful.max.source_states),
            max_source_connections: opt_int_to_wire(stateful.max.source_connections),
            max_new_connections_count: opt_int_to_wire(stateful.max.new_connections.count),
            max_new_connections_seconds: opt_int_to_wire(stateful.max.new_connections.seconds),
            overload_table: SelectedMap::from(stateful.overload_table.as_str()),
            no_pfsync: bool_to_wire(stateful.no_pfsync),

            traffic_shaper: SelectedMap::from(model.traffic_shaping.shaper.as_str()),
            traffic_shaper_reverse: SelectedMap::from(
                model.traffic_shaping.reverse_shaper.as_str(),
            ),

            gateway: SelectedMap::from(model.source_routing.gateway.as_str()),
            disable_reply_to: bool_to_wire(model.source_routing.disable_reply_to),
            reply_to: SelectedMap::from(model.source_routing.reply_to.as_str()),

            match_priority: SelectedMap::new(opt_int_to_wire(priority.match_priority)),
            set_priority: SelectedMap::new(opt_int_to_wire(priority.set_priority)),
            set_priority_low_delay: SelectedMap::new(opt_int_to_wire(priority.low_delay_set)),
            match_tos: SelectedMap::from(priority.match_tos.as_str()),

            set_local_tag: model.internal_tagging.set_local.clone(),
            match_local_tag: model.internal_tagging.match_local.clone(),
        }
    }

    fn from_wire(wire: api::Filter) -> Result<Filter, ConvertError> {
        Ok(Filter {
            enabled: wire_to_bool(&wire.enabled),
            sequence: wire_to_opt_int(&wire.sequence).unwrap_or_else(default_sequence),
            no_xmlrpc_sync: wire_to_bool(&wire.no_xmlrpc_sync),
            description: string_or_none(wire.description),
            categories: wire_to_set(wire.categories.into_vec()),

            interface: InterfaceBlock {
                invert: wire_to_bool(&wire.invert_interface),
                interface: wire_to_set(wire.interface.into_vec()),
            },

            filter: FilterBlock {
                quick: wire_to_bool(&wire.quick),
                action: parse_enum("filter.action", wire.action.as_str())?,
                allow_options: wire_to_bool(&wire.allow_options),
                direction: parse_enum("filter.direction", wire.direction.as_str())?,
                ip_protocol: parse_enum("filter.ip_protocol", wire.ip_protocol.as_str())?,
                protocol: wire.protocol.into_string(),
                icmp_type: wire_to_set(wire.icmp_type.into_vec()),
                source: Location {
                    net: wire.source_net,
                    port: wire.source_port,
                    invert: wire_to_bool(&wire.source_invert),
                },
                destination: Location {
                    net: wire.destination_net,
                    port: wire.destination_port,
                    invert: wire_to_bool(&wire.destination_invert),
                },
                log: wire_to_bool(&wire.log),
                tcp_flags: wire_to_set(wire.tcp_flags.into_vec()),
                tcp_flags_out_of: wire_to_set(wire.tcp_flags_out_of.into_vec()),
                schedule: wire.schedule.into_string(),
            },

            stateful_firewall: StatefulFirewall {
                state_type: parse_enum("stateful_firewall.type", wire.state_type.as_str())?,
                policy: parse_enum("stateful_firewall.policy", wire.state_policy.as_str())?,
                timeout: wire_to_opt_int(&wire.state_timeout),
                adaptive_timeouts: AdaptiveTimeouts {
                    start: wire_to_opt_int(&wire.adaptive_timeouts_start),
                    end: wire_to_opt_int(&wire.adaptive_timeouts_end),
                },
                max: Max {
                    states: wire_to_opt_int(&wire.max_states),
                    source_nodes: wire_to_opt_int(&wire.max_source_nodes),
                    source_states: wire_to_opt_int(&wire.max_source_states),
                    source_connections: wire_to_opt_int(&wire.max_source_connections),
                    new_connections: NewConnections {
                        count: wire_to_opt_int(&wire.max_new_connections_count),
                        seconds: wire_to_opt_int(&wire.max_new_connections_seconds),
                    },
                },
                overload_table: wire.overload_table.into_string(),
                no_pfsync: wire_to_bool(&wire.no_pfsync),
            },

            traffic_shaping: TrafficShaping {
                shaper: wire.traffic_shaper.into_string(),
                reverse_shaper: wire.traffic_shaper_reverse.into_string(),
            },

            source_routing: SourceRouting {
                gateway: wire.gateway.into_string(),
                disable_reply_to: wire_to_bool(&wire.disable_reply_to),
                reply_to: wire.reply_to.into_string(),
            },

            priority: Priority {
                match_priority: wire_to_opt_int(wire.match_priority.as_str()),
                set_priority: wire_to_opt_int(wire.set_priority.as_str()),
                low_delay_set: wire_to_opt_int(wire.set_priority_low_delay.as_str()),
                match_tos: wire.match_tos.into_string(),
            },

            internal_tagging: InternalTagging {
                set_local: wire.set_local_tag,
                match_local: wire.match_local_tag,
            },
        })
    }

    async fn add(client: &Client, wire: &api::Filter) -> Result<String, Error> {
        client.firewall().add_filter(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Filter, Error> {
        client.firewall().get_filter(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Filter) -> Result<(), Error> {
        client.firewall().update_filter(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.firewall().delete_filter(id).await
    }
}
