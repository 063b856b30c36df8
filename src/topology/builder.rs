//! Topology inference from parsed devices.
//!
//! Every unordered pair of distinct devices is compared interface by
//! interface, and each interface pair is run through [`RULE_ORDER`]. A graph
//! holds at most one link per device pair, so when several rules (or several
//! interface pairs) match the same devices, the last match wins. Scan order
//! is: device pairs in input order (earlier device first), then interfaces in
//! configuration order, then rules in [`RULE_ORDER`].
//!
//! The scan is O(D² · I²) with no pruning; fine for lab-sized inventories.

use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::types::{Link, TopologyGraph};
use crate::device::{Device, Interface};

/// A single link inference rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceRule {
    /// Both interfaces are addressed on the same IPv4 network (L3)
    SharedSubnet,
    /// Both interfaces carry at least one common VLAN (L2)
    VlanOverlap,
    /// One side is a trunk and the other has no switchport mode (L2)
    TrunkToUntagged,
}

/// Rule evaluation order; later rules overwrite earlier ones for the same pair
pub const RULE_ORDER: [InferenceRule; 3] = [
    InferenceRule::SharedSubnet,
    InferenceRule::VlanOverlap,
    InferenceRule::TrunkToUntagged,
];

impl InferenceRule {
    /// Evaluate the rule for one interface pair; `local` is the earlier device
    pub fn infer(
        self,
        local: &Device,
        local_if: &Interface,
        remote: &Device,
        remote_if: &Interface,
    ) -> Option<Link> {
        match self {
            InferenceRule::SharedSubnet => {
                let subnet = local_if.network?;
                if remote_if.network? != subnet {
                    return None;
                }
                Some(Link::L3 {
                    subnet,
                    mtu: (local_if.mtu, remote_if.mtu),
                    bandwidth: (local_if.bandwidth, remote_if.bandwidth),
                })
            }
            InferenceRule::VlanOverlap => {
                if local_if.vlans.is_empty() || remote_if.vlans.is_empty() {
                    return None;
                }
                let remote_vlans: BTreeSet<_> = remote_if.vlans.iter().copied().collect();
                let common: BTreeSet<_> = local_if
                    .vlans
                    .iter()
                    .copied()
                    .filter(|vlan| remote_vlans.contains(vlan))
                    .collect();
                if common.is_empty() {
                    None
                } else {
                    Some(Link::L2 { vlans: common })
                }
            }
            InferenceRule::TrunkToUntagged => {
                let trunk_side = if local_if.is_trunk() && !remote_if.has_mode() {
                    local
                } else if remote_if.is_trunk() && !local_if.has_mode() {
                    remote
                } else {
                    return None;
                };
                // Device-level declarations, not the interface allowed list
                Some(Link::L2 { vlans: trunk_side.declared_vlan_ids().collect() })
            }
        }
    }
}

/// Build the topology graph for a device inventory
pub fn build_topology(devices: &[Device]) -> TopologyGraph {
    let mut topology = TopologyGraph::new();

    for device in devices {
        if topology.contains_device(&device.hostname) {
            warn!("Duplicate hostname '{}': later configuration replaces its classification", device.hostname);
        }
        topology.add_device(&device.hostname, device.kind());
    }

    for (i, local) in devices.iter().enumerate() {
        for remote in &devices[i + 1..] {
            if local.hostname == remote.hostname {
                continue;
            }
            infer_pair(&mut topology, local, remote);
        }
    }

    info!(
        "Built topology with {} devices and {} links",
        topology.node_count(),
        topology.link_count()
    );

    topology
}

fn infer_pair(topology: &mut TopologyGraph, local: &Device, remote: &Device) {
    for local_if in &local.interfaces {
        for remote_if in &remote.interfaces {
            for rule in RULE_ORDER {
                let Some(link) = rule.infer(local, local_if, remote, remote_if) else {
                    continue;
                };
                debug!(
                    "{:?}: {}:{} <-> {}:{} => {} link",
                    rule,
                    local.hostname,
                    local_if.name,
                    remote.hostname,
                    remote_if.name,
                    link.kind_label()
                );
                if let Some(previous) = topology.set_link(&local.hostname, &remote.hostname, link) {
                    debug!(
                        "Replaced {} link {}-{}",
                        previous.kind_label(),
                        local.hostname,
                        remote.hostname
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{parse_device, DeviceKind};

    fn device(config: &str) -> Device {
        parse_device(config).unwrap()
    }

    #[test]
    fn test_shared_subnet_yields_single_l3_link() {
        let devices = vec![
            device("hostname R1\ninterface Gi0/0\n ip address 10.0.0.1 255.255.255.252\n mtu 1500\n"),
            device("hostname R2\ninterface Gi0/0\n ip address 10.0.0.2 255.255.255.252\n bandwidth 100000\n"),
        ];
        let topo = build_topology(&devices);

        assert_eq!(topo.node_count(), 2);
        assert_eq!(topo.link_count(), 1);
        match topo.link("R1", "R2").unwrap() {
            Link::L3 { subnet, mtu, bandwidth } => {
                assert_eq!(subnet.to_string(), "10.0.0.0/30");
                assert_eq!(*mtu, (Some(1500), None));
                assert_eq!(*bandwidth, (None, Some(100_000)));
            }
            other => panic!("expected L3 link, got {:?}", other),
        }
    }

    #[test]
    fn test_trunk_to_untagged_router_carries_declared_vlans() {
        let devices = vec![
            device("hostname SW1\nvlan 10\nvlan 20\ninterface Gi0/1\n switchport mode trunk\n switchport trunk allowed vlan 10\n"),
            device("hostname R1\ninterface Gi0/0\n ip address 192.168.0.1 255.255.255.0\n"),
        ];
        let topo = build_topology(&devices);

        assert_eq!(topo.device("SW1").unwrap().kind, DeviceKind::Switch);
        assert_eq!(topo.device("R1").unwrap().kind, DeviceKind::Router);
        let vlans: Vec<_> = topo.link("R1", "SW1").unwrap().vlans().collect();
        assert_eq!(vlans, vec![10, 20]);
    }

    #[test]
    fn test_trunk_without_declared_vlans_gives_empty_set() {
        let devices = vec![
            device("hostname R1\ninterface Gi0/0\n"),
            device("hostname R2\ninterface Gi0/0\n switchport mode trunk\n"),
        ];
        let topo = build_topology(&devices);
        assert_eq!(topo.link("R1", "R2"), Some(&Link::L2 { vlans: BTreeSet::new() }));
    }

    #[test]
    fn test_vlan_overlap_intersection() {
        let devices = vec![
            device("hostname SW1\nvlan 1\ninterface Gi0/1\n switchport mode access\n switchport access vlan 10\n"),
            device("hostname SW2\nvlan 1\ninterface Gi0/1\n switchport mode trunk\n switchport trunk allowed vlan 5,10-12\n"),
        ];
        let topo = build_topology(&devices);
        let vlans: Vec<_> = topo.link("SW1", "SW2").unwrap().vlans().collect();
        assert_eq!(vlans, vec![10]);
    }

    #[test]
    fn test_no_rule_no_link() {
        let devices = vec![
            device("hostname R1\ninterface Gi0/0\n ip address 10.0.0.1 255.255.255.0\n switchport mode access\n"),
            device("hostname R2\ninterface Gi0/0\n ip address 10.0.1.1 255.255.255.0\n switchport mode trunk\n"),
        ];
        let topo = build_topology(&devices);
        assert_eq!(topo.link_count(), 0);
    }

    #[test]
    fn test_last_matching_rule_wins() {
        // Same subnet and a trunk facing an interface without mode: the trunk
        // rule is evaluated last and replaces the L3 link
        let devices = vec![
            device("hostname R1\ninterface Gi0/0\n ip address 10.0.0.1 255.255.255.0\n"),
            device("hostname SW1\nvlan 30\ninterface Vlan30\n ip address 10.0.0.2 255.255.255.0\n switchport mode trunk\n"),
        ];
        let topo = build_topology(&devices);
        assert_eq!(topo.link_count(), 1);
        let vlans: Vec<_> = topo.link("R1", "SW1").unwrap().vlans().collect();
        assert_eq!(vlans, vec![30]);
    }

    #[test]
    fn test_later_interface_pair_overwrites_earlier() {
        let devices = vec![
            device("hostname R1\ninterface Gi0/0\n ip address 10.0.0.1 255.255.255.252\ninterface Gi0/1\n ip address 10.0.1.1 255.255.255.252\n"),
            device("hostname R2\ninterface Gi0/0\n ip address 10.0.0.2 255.255.255.252\ninterface Gi0/1\n ip address 10.0.1.2 255.255.255.252\n"),
        ];
        let topo = build_topology(&devices);
        match topo.link("R1", "R2").unwrap() {
            Link::L3 { subnet, .. } => assert_eq!(subnet.to_string(), "10.0.1.0/30"),
            other => panic!("expected L3 link, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_hostnames_do_not_self_link() {
        let config = "hostname R1\ninterface Gi0/0\n ip address 10.0.0.1 255.255.255.0\n";
        let topo = build_topology(&[device(config), device(config)]);
        assert_eq!(topo.node_count(), 1);
        assert_eq!(topo.link_count(), 0);
    }
}
