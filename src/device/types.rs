//! Device configuration records.
//!
//! A [`Device`] is produced once per configuration file by the parser and is
//! immutable afterwards. Optional attributes are modelled as `Option` so that
//! an absent `mtu` or `ip address` line is distinguishable from a zero value.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

/// VLAN identifier (802.1Q, 0..=4095)
pub type VlanId = u16;

/// Highest VLAN id accepted by the parser
pub const MAX_VLAN_ID: VlanId = 4095;

/// Node classification in the topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Router,
    Switch,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Router => write!(f, "router"),
            DeviceKind::Switch => write!(f, "switch"),
        }
    }
}

/// Switchport mode configured on an interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchportMode {
    Access,
    Trunk,
    /// Any other mode keyword (e.g. `dynamic`); still counts as "mode set"
    Other(String),
}

impl SwitchportMode {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "access" => SwitchportMode::Access,
            "trunk" => SwitchportMode::Trunk,
            other => SwitchportMode::Other(other.to_string()),
        }
    }

    pub fn is_trunk(&self) -> bool {
        matches!(self, SwitchportMode::Trunk)
    }
}

/// A named attachment point on a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub description: Option<String>,
    pub ip: Option<Ipv4Addr>,
    pub mask: Option<Ipv4Addr>,
    /// Derived from `mask`; set only together with `ip`
    pub prefix_len: Option<u8>,
    /// Derived from `ip` and `mask`
    pub network: Option<Ipv4Net>,
    pub mtu: Option<u32>,
    /// Configured bandwidth in kbps
    pub bandwidth: Option<u64>,
    /// VLANs carried, in configuration order (duplicates preserved)
    pub vlans: Vec<VlanId>,
    pub mode: Option<SwitchportMode>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            ip: None,
            mask: None,
            prefix_len: None,
            network: None,
            mtu: None,
            bandwidth: None,
            vlans: Vec::new(),
            mode: None,
        }
    }

    pub fn is_trunk(&self) -> bool {
        self.mode.as_ref().map_or(false, SwitchportMode::is_trunk)
    }

    pub fn has_mode(&self) -> bool {
        self.mode.is_some()
    }
}

/// A VLAN declared at device level (`vlan <id>` block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanDecl {
    pub id: VlanId,
    pub name: Option<String>,
}

/// `network <addr> <wildcard> area <area>` statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfNetwork {
    pub network: Ipv4Addr,
    pub wildcard: Ipv4Addr,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OspfInstance {
    pub process_id: Option<String>,
    pub networks: Vec<OspfNetwork>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpNeighbor {
    pub ip: Ipv4Addr,
    pub remote_as: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpInstance {
    pub asn: u32,
    pub neighbors: Vec<BgpNeighbor>,
}

/// `ip route <prefix> <mask> <next-hop>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub prefix: Ipv4Addr,
    pub mask: Ipv4Addr,
    /// Next-hop address or exit interface name
    pub next_hop: String,
}

/// Routing configuration; a device may hold any number of each kind
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub ospf: Vec<OspfInstance>,
    pub bgp: Vec<BgpInstance>,
    #[serde(rename = "static")]
    pub static_routes: Vec<StaticRoute>,
}

/// Discovery protocol flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Features {
    pub cdp: bool,
    pub lldp: bool,
}

/// A parsed router or switch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub hostname: String,
    pub interfaces: Vec<Interface>,
    pub vlans: Vec<VlanDecl>,
    pub routing: RoutingConfig,
    pub features: Features,
}

impl Device {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            interfaces: Vec::new(),
            vlans: Vec::new(),
            routing: RoutingConfig::default(),
            features: Features::default(),
        }
    }

    /// A device is a switch iff it declares at least one VLAN
    pub fn is_switch(&self) -> bool {
        !self.vlans.is_empty()
    }

    pub fn kind(&self) -> DeviceKind {
        if self.is_switch() {
            DeviceKind::Switch
        } else {
            DeviceKind::Router
        }
    }

    /// Ids of all device-level VLAN declarations, in declaration order
    pub fn declared_vlan_ids(&self) -> impl Iterator<Item = VlanId> + '_ {
        self.vlans.iter().map(|v| v.id)
    }
}
