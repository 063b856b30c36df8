//! Performance audit of an inferred topology.
//!
//! Reports whether the topology is a single connected component, flags L3
//! links whose MTU or bandwidth falls below the configured thresholds, and
//! classifies path redundancy for every ordered node pair.
//!
//! Simple-path enumeration is exponential in the worst case, so it is bounded
//! by `max_paths` per pair and optionally by `max_path_hops`.

use log::{debug, info};
use petgraph::algo::all_simple_paths;
use petgraph::graph::NodeIndex;

use super::types::*;
use crate::settings::AnalysisSettings;
use crate::topology::{Link, LinkId, TopologyGraph};

/// Run the full performance audit
pub fn analyze_performance(topology: &TopologyGraph, settings: &AnalysisSettings) -> PerformanceReport {
    let connected = topology.component_count() == 1;
    let bottlenecks = find_bottlenecks(topology, settings);
    let redundancy = analyze_redundancy(topology, settings);

    info!(
        "Performance audit: connected={}, {} bottlenecks, {} node pairs",
        connected,
        bottlenecks.len(),
        redundancy.len()
    );

    PerformanceReport {
        connected,
        bottlenecks,
        redundancy,
    }
}

/// Flag L3 links whose smaller MTU or bandwidth is below the thresholds.
///
/// Sides without a configured value do not take part in the minimum.
pub fn find_bottlenecks(topology: &TopologyGraph, settings: &AnalysisSettings) -> Vec<Bottleneck> {
    let mut bottlenecks = Vec::new();

    for (u, v, link) in topology.links() {
        let Link::L3 { mtu, bandwidth, .. } = link else {
            continue;
        };

        let min_mtu = [mtu.0, mtu.1].into_iter().flatten().min();
        if min_mtu.is_some_and(|m| m < settings.min_mtu) {
            bottlenecks.push(Bottleneck {
                node_u: u.to_string(),
                node_v: v.to_string(),
                issue: BottleneckIssue::MtuMismatch,
            });
        }

        let min_bandwidth = [bandwidth.0, bandwidth.1].into_iter().flatten().min();
        if min_bandwidth.is_some_and(|bw| bw < settings.min_bandwidth_kbps) {
            bottlenecks.push(Bottleneck {
                node_u: u.to_string(),
                node_v: v.to_string(),
                issue: BottleneckIssue::LowBandwidth,
            });
        }
    }

    bottlenecks
}

/// Classify redundancy for every ordered pair of distinct nodes, in node order
pub fn analyze_redundancy(topology: &TopologyGraph, settings: &AnalysisSettings) -> RedundancyReport {
    let nodes: Vec<NodeIndex> = topology.graph().node_indices().collect();
    let mut report = Vec::with_capacity(nodes.len().saturating_sub(1) * nodes.len());

    for &from in &nodes {
        for &to in &nodes {
            if from == to {
                continue;
            }
            let (paths, capped) = count_simple_paths(topology, from, to, settings);
            if capped {
                debug!(
                    "Path enumeration {} -> {} stopped at {} paths",
                    topology.hostname(from),
                    topology.hostname(to),
                    paths
                );
            }
            report.push((
                LinkId::new(topology.hostname(from), topology.hostname(to)),
                Redundancy::from_path_count(paths, capped),
            ));
        }
    }

    report
}

/// Count simple paths between two nodes, up to `max_paths`.
///
/// Returns the count and whether enumeration stopped at the cap.
fn count_simple_paths(
    topology: &TopologyGraph,
    from: NodeIndex,
    to: NodeIndex,
    settings: &AnalysisSettings,
) -> (usize, bool) {
    // A path of h hops has h - 1 intermediate nodes
    let max_intermediate = settings.max_path_hops.map(|hops| hops.saturating_sub(1));

    let found = all_simple_paths::<Vec<NodeIndex>, _>(topology.graph(), from, to, 0, max_intermediate)
        .take(settings.max_paths + 1)
        .count();

    if found > settings.max_paths {
        (settings.max_paths, true)
    } else {
        (found, false)
    }
}
