//! What-if simulation over a topology.
//!
//! Every query reads the canonical topology. Failure scenarios clone it and
//! mutate only the clone, so a rejected or completed query never changes the
//! graph the caller holds.

use std::collections::{HashMap, VecDeque};

use log::debug;

use super::types::*;
use crate::device::VlanId;
use crate::topology::{Link, LinkId, TopologyGraph};

/// Rejected simulation preconditions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Link {link} not found in topology")]
    LinkNotFound { link: LinkId },
    #[error("VLAN {vlan} not present on link {link}")]
    VlanNotOnLink { vlan: VlanId, link: LinkId },
}

impl SimulationError {
    /// Stable variant name used in serialized reports
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationError::LinkNotFound { .. } => "LinkNotFound",
            SimulationError::VlanNotOnLink { .. } => "VlanNotOnLink",
        }
    }
}

/// Shortest hop-count path from `src` to `dst`.
///
/// Neighbours are visited in ascending hostname order, so among equally short
/// paths the lexicographically smallest one is returned. `None` when either
/// endpoint is unknown or no path exists.
pub fn shortest_path(topology: &TopologyGraph, src: &str, dst: &str) -> Option<Vec<String>> {
    if !topology.contains_device(src) || !topology.contains_device(dst) {
        return None;
    }
    if src == dst {
        return Some(vec![src.to_string()]);
    }

    let mut parents: HashMap<&str, &str> = HashMap::new();
    let mut queue = VecDeque::from([src]);
    parents.insert(src, src);

    while let Some(current) = queue.pop_front() {
        for next in topology.neighbors(current) {
            if parents.contains_key(next) {
                continue;
            }
            parents.insert(next, current);
            if next == dst {
                return Some(unwind_path(&parents, src, dst));
            }
            queue.push_back(next);
        }
    }

    None
}

fn unwind_path(parents: &HashMap<&str, &str>, src: &str, dst: &str) -> Vec<String> {
    let mut path = vec![dst.to_string()];
    let mut current = dst;
    while current != src {
        current = parents[current];
        path.push(current.to_string());
    }
    path.reverse();
    path
}

pub fn simulate_traffic(topology: &TopologyGraph, src: &str, dst: &str) -> TrafficReport {
    TrafficReport {
        src: src.to_string(),
        dst: dst.to_string(),
        path: shortest_path(topology, src, dst),
    }
}

/// Map each VLAN to the hostnames touching an L2 link that carries it
pub fn vlan_reachability(topology: &TopologyGraph) -> VlanReachability {
    let mut reachability = VlanReachability::new();

    for (u, v, link) in topology.links() {
        for vlan in link.vlans() {
            let members = reachability.entry(vlan).or_default();
            members.insert(u.to_string());
            members.insert(v.to_string());
        }
    }

    reachability
}

/// Remove the link `u-v` from a copy of the topology and re-route `src -> dst`
pub fn simulate_failure(
    topology: &TopologyGraph,
    link: &LinkId,
    src: &str,
    dst: &str,
) -> Result<FailureReport, SimulationError> {
    let mut degraded = topology.clone();
    degraded
        .remove_link(&link.u, &link.v)
        .ok_or_else(|| SimulationError::LinkNotFound { link: link.clone() })?;

    let new_path = shortest_path(&degraded, src, dst);
    let status = match new_path {
        Some(_) => FailureStatus::Rerouted,
        None => FailureStatus::Failed,
    };
    debug!("Failure of {}: {} -> {} {}", link, src, dst, status);

    Ok(FailureReport {
        failed_link: link.clone(),
        src: src.to_string(),
        dst: dst.to_string(),
        status,
        new_path,
    })
}

/// Prune one VLAN from one L2 link on a copy of the topology and recompute
/// VLAN reachability
pub fn simulate_vlan_failure(
    topology: &TopologyGraph,
    vlan: VlanId,
    link: &LinkId,
) -> Result<VlanFailureReport, SimulationError> {
    let mut degraded = topology.clone();
    let edge = degraded
        .link_mut(&link.u, &link.v)
        .ok_or_else(|| SimulationError::LinkNotFound { link: link.clone() })?;

    let carried = match edge {
        Link::L2 { vlans } => vlans.remove(&vlan),
        Link::L3 { .. } => false,
    };
    if !carried {
        return Err(SimulationError::VlanNotOnLink {
            vlan,
            link: link.clone(),
        });
    }

    Ok(VlanFailureReport {
        failed_vlan: vlan,
        removed_from: link.clone(),
        new_vlan_reachability: vlan_reachability(&degraded),
    })
}

/// Utilization of every L3 link with bandwidth set on both sides.
///
/// The local side is the actual rate and the remote side the maximum.
pub fn bandwidth_utilization(topology: &TopologyGraph) -> BandwidthReport {
    topology
        .links()
        .filter_map(|(u, v, link)| match link {
            Link::L3 {
                bandwidth: (Some(actual), Some(max)),
                ..
            } => Some((LinkId::new(u, v), utilization(*actual, *max))),
            _ => None,
        })
        .collect()
}

fn utilization(actual_kbps: u64, max_kbps: u64) -> LinkUtilization {
    let util_percent = if max_kbps == 0 {
        0.0
    } else {
        (actual_kbps as f64 / max_kbps as f64 * 100.0 * 100.0).round() / 100.0
    };
    LinkUtilization {
        actual_kbps,
        max_kbps,
        util_percent,
    }
}

/// Routing protocols with a synthetic convergence model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceProtocol {
    Ospf,
    Bgp,
}

impl ConvergenceProtocol {
    /// Case-insensitive lookup; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "OSPF" => Some(ConvergenceProtocol::Ospf),
            "BGP" => Some(ConvergenceProtocol::Bgp),
            _ => None,
        }
    }

    /// Synthetic convergence time in ms for the node at `position`
    pub fn convergence_ms(self, position: usize) -> u64 {
        let i = position as u64;
        match self {
            ConvergenceProtocol::Ospf => 50 + 5 * i,
            ConvergenceProtocol::Bgp => 200 + 20 * i,
        }
    }
}

/// Deterministic per-node convergence estimates in node order.
///
/// These are not protocol simulations. An unknown protocol yields `None` for
/// every node.
pub fn route_convergence(topology: &TopologyGraph, protocol: &str) -> ConvergenceReport {
    let protocol = ConvergenceProtocol::parse(protocol);
    topology
        .nodes()
        .enumerate()
        .map(|(i, node)| (node.hostname.clone(), protocol.map(|p| p.convergence_ms(i))))
        .collect()
}
