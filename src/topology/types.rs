//! Topology graph type definitions.
//!
//! The topology is an undirected petgraph graph whose node weights are
//! devices and whose edge weights are inferred links, plus a hostname index.
//! Node iteration order is insertion order (the order devices were handed to
//! the builder); every report that lists nodes relies on that order.

use std::collections::{BTreeSet, HashMap};

use ipnet::Ipv4Net;
use petgraph::algo::connected_components;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Serialize, Serializer};

use crate::device::{DeviceKind, VlanId};

/// A topology node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceNode {
    pub hostname: String,
    pub kind: DeviceKind,
}

/// An inferred link between two devices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Link {
    /// Both ends sit on the same IPv4 subnet
    L3 {
        subnet: Ipv4Net,
        /// (local, remote) MTU
        mtu: (Option<u32>, Option<u32>),
        /// (local, remote) bandwidth in kbps
        bandwidth: (Option<u64>, Option<u64>),
    },
    /// Both ends share VLAN membership
    L2 { vlans: BTreeSet<VlanId> },
}

impl Link {
    pub fn is_l2(&self) -> bool {
        matches!(self, Link::L2 { .. })
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Link::L3 { .. } => "L3",
            Link::L2 { .. } => "L2",
        }
    }

    /// VLANs carried by an L2 link; empty for L3
    pub fn vlans(&self) -> impl Iterator<Item = VlanId> + '_ {
        let vlans = match self {
            Link::L2 { vlans } => Some(vlans),
            Link::L3 { .. } => None,
        };
        vlans.into_iter().flatten().copied()
    }
}

/// An unordered device pair, rendered as `u-v`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId {
    pub u: String,
    pub v: String,
}

impl LinkId {
    pub fn new(u: impl Into<String>, v: impl Into<String>) -> Self {
        Self { u: u.into(), v: v.into() }
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.u, self.v)
    }
}

impl Serialize for LinkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Undirected device graph with at most one link per device pair
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: UnGraph<DeviceNode, Link>,
    index: HashMap<String, NodeIndex>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device node. A repeated hostname keeps its original position
    /// and takes the new classification.
    pub fn add_device(&mut self, hostname: &str, kind: DeviceKind) -> NodeIndex {
        if let Some(&idx) = self.index.get(hostname) {
            self.graph[idx].kind = kind;
            return idx;
        }
        let idx = self.graph.add_node(DeviceNode { hostname: hostname.to_string(), kind });
        self.index.insert(hostname.to_string(), idx);
        idx
    }

    /// Set the link between two known devices, returning the link it replaced
    pub fn set_link(&mut self, a: &str, b: &str, link: Link) -> Option<Link> {
        let (a, b) = (self.node_index(a)?, self.node_index(b)?);
        match self.graph.find_edge(a, b) {
            Some(edge) => Some(std::mem::replace(&mut self.graph[edge], link)),
            None => {
                self.graph.add_edge(a, b, link);
                None
            }
        }
    }

    /// Remove the link between `u` and `v` in either orientation
    pub fn remove_link(&mut self, u: &str, v: &str) -> Option<Link> {
        let edge = self.edge_index(u, v)?;
        self.graph.remove_edge(edge)
    }

    pub fn link(&self, u: &str, v: &str) -> Option<&Link> {
        self.edge_index(u, v).map(|edge| &self.graph[edge])
    }

    pub fn link_mut(&mut self, u: &str, v: &str) -> Option<&mut Link> {
        let edge = self.edge_index(u, v)?;
        self.graph.edge_weight_mut(edge)
    }

    pub fn contains_device(&self, hostname: &str) -> bool {
        self.index.contains_key(hostname)
    }

    pub fn device(&self, hostname: &str) -> Option<&DeviceNode> {
        self.node_index(hostname).map(|idx| &self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &DeviceNode> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Links as `(u, v, link)` in edge order
    pub fn links(&self) -> impl Iterator<Item = (&str, &str, &Link)> + '_ {
        self.graph.edge_references().map(move |edge| {
            (
                self.graph[edge.source()].hostname.as_str(),
                self.graph[edge.target()].hostname.as_str(),
                edge.weight(),
            )
        })
    }

    /// Neighbour hostnames in ascending order
    pub fn neighbors(&self, hostname: &str) -> Vec<&str> {
        let mut neighbors: Vec<&str> = match self.node_index(hostname) {
            Some(idx) => self
                .graph
                .neighbors(idx)
                .map(|n| self.graph[n].hostname.as_str())
                .collect(),
            None => Vec::new(),
        };
        neighbors.sort_unstable();
        neighbors
    }

    /// Number of connected components (zero for an empty graph)
    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }

    pub(crate) fn node_index(&self, hostname: &str) -> Option<NodeIndex> {
        self.index.get(hostname).copied()
    }

    pub(crate) fn hostname(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].hostname
    }

    pub(crate) fn graph(&self) -> &UnGraph<DeviceNode, Link> {
        &self.graph
    }

    fn edge_index(&self, u: &str, v: &str) -> Option<EdgeIndex> {
        self.graph.find_edge(self.node_index(u)?, self.node_index(v)?)
    }
}
