//! Core data types for topology analysis and simulation reports.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use serde::{Serialize, Serializer};

use super::simulation::SimulationError;
use crate::device::VlanId;
use crate::topology::LinkId;

/// VLAN id -> hostnames touching an L2 link that carries it
pub type VlanReachability = BTreeMap<VlanId, BTreeSet<String>>;

/// Ordered (pair, classification) entries in node order
pub type RedundancyReport = Vec<(LinkId, Redundancy)>;

/// Ordered (link, utilization) entries in link order
pub type BandwidthReport = Vec<(LinkId, LinkUtilization)>;

/// Ordered (hostname, synthetic convergence time in ms) entries in node order
pub type ConvergenceReport = Vec<(String, Option<u64>)>;

/// Serialize `(key, value)` entries as a map, keeping entry order
pub fn ordered_map<S, K, V>(entries: &[(K, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    K: Display,
    V: Serialize,
{
    serializer.collect_map(entries.iter().map(|(key, value)| (key.to_string(), value)))
}

/// Why an L3 link was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BottleneckIssue {
    #[serde(rename = "MTU mismatch")]
    MtuMismatch,
    #[serde(rename = "Low bandwidth")]
    LowBandwidth,
}

impl std::fmt::Display for BottleneckIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BottleneckIssue::MtuMismatch => write!(f, "MTU mismatch"),
            BottleneckIssue::LowBandwidth => write!(f, "Low bandwidth"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bottleneck {
    pub node_u: String,
    pub node_v: String,
    pub issue: BottleneckIssue,
}

/// Path redundancy between an ordered node pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redundancy {
    NoPath,
    Single,
    /// Two or more simple paths; `capped` when enumeration hit `max_paths`
    Redundant { paths: usize, capped: bool },
}

impl Redundancy {
    pub fn from_path_count(paths: usize, capped: bool) -> Self {
        match paths {
            0 => Redundancy::NoPath,
            1 => Redundancy::Single,
            _ => Redundancy::Redundant { paths, capped },
        }
    }
}

impl std::fmt::Display for Redundancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Redundancy::NoPath => write!(f, "No path"),
            Redundancy::Single => write!(f, "Only 1 path (no redundancy)"),
            Redundancy::Redundant { paths, capped: false } => {
                write!(f, "{} paths available (redundant)", paths)
            }
            Redundancy::Redundant { paths, capped: true } => {
                write!(f, "{}+ paths available (redundant)", paths)
            }
        }
    }
}

impl Serialize for Redundancy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Connectivity, bottleneck and redundancy audit of a topology
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub connected: bool,
    pub bottlenecks: Vec<Bottleneck>,
    #[serde(serialize_with = "ordered_map")]
    pub redundancy: RedundancyReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficReport {
    pub src: String,
    pub dst: String,
    /// Shortest hop-count path; `None` when unreachable or unknown
    pub path: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStatus {
    Rerouted,
    Failed,
}

impl std::fmt::Display for FailureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStatus::Rerouted => write!(f, "Traffic still possible (rerouted)"),
            FailureStatus::Failed => write!(f, "Traffic FAILED (no alternate path)"),
        }
    }
}

impl Serialize for FailureStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub failed_link: LinkId,
    pub src: String,
    pub dst: String,
    pub status: FailureStatus,
    pub new_path: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlanFailureReport {
    pub failed_vlan: VlanId,
    pub removed_from: LinkId,
    pub new_vlan_reachability: VlanReachability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkUtilization {
    pub actual_kbps: u64,
    pub max_kbps: u64,
    pub util_percent: f64,
}

/// Result of a simulation query whose preconditions may not hold
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome<T> {
    Completed(T),
    Rejected { error: String, kind: &'static str },
}

impl<T> From<Result<T, SimulationError>> for QueryOutcome<T> {
    fn from(result: Result<T, SimulationError>) -> Self {
        match result {
            Ok(value) => QueryOutcome::Completed(value),
            Err(err) => QueryOutcome::Rejected {
                error: err.to_string(),
                kind: err.kind(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub total_devices: usize,
    pub routers: usize,
    pub switches: usize,
    pub total_links: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationSection {
    pub traffic: Vec<TrafficReport>,
    pub vlan_reachability: VlanReachability,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceSection {
    #[serde(rename = "OSPF", serialize_with = "ordered_map")]
    pub ospf: ConvergenceReport,
    #[serde(rename = "BGP", serialize_with = "ordered_map")]
    pub bgp: ConvergenceReport,
}

/// Full analysis report consumed by the exporters
#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub metadata: ReportMetadata,
    #[serde(serialize_with = "findings_or_clean")]
    pub validation: Vec<String>,
    pub performance: PerformanceReport,
    pub simulation: SimulationSection,
    pub failure_simulation: Vec<QueryOutcome<FailureReport>>,
    pub vlan_failure_simulation: Vec<QueryOutcome<VlanFailureReport>>,
    #[serde(serialize_with = "ordered_map")]
    pub bandwidth_utilization: BandwidthReport,
    pub route_convergence: ConvergenceSection,
}

/// Message used in place of an empty findings list
pub const NO_FINDINGS: &str = "No errors found";

fn findings_or_clean<S: Serializer>(findings: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    if findings.is_empty() {
        serializer.serialize_str(NO_FINDINGS)
    } else {
        serializer.collect_seq(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redundancy_boundaries() {
        assert_eq!(Redundancy::from_path_count(0, false), Redundancy::NoPath);
        assert_eq!(Redundancy::from_path_count(1, false), Redundancy::Single);
        assert_eq!(
            Redundancy::from_path_count(2, false),
            Redundancy::Redundant { paths: 2, capped: false }
        );
        assert_eq!(
            Redundancy::from_path_count(2, false).to_string(),
            "2 paths available (redundant)"
        );
        assert_eq!(
            Redundancy::from_path_count(100, true).to_string(),
            "100+ paths available (redundant)"
        );
    }

    #[test]
    fn test_ordered_map_keeps_entry_order() {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(serialize_with = "ordered_map")]
            entries: ConvergenceReport,
        }

        let wrapper = Wrapper {
            entries: vec![("Z".to_string(), Some(50)), ("A".to_string(), None)],
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert_eq!(json, r#"{"entries":{"Z":50,"A":null}}"#);
    }

    #[test]
    fn test_query_outcome_serialization() {
        let ok: QueryOutcome<u32> = Result::<u32, SimulationError>::Ok(7).into();
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!(7));

        let err: QueryOutcome<u32> = Result::<u32, SimulationError>::Err(SimulationError::LinkNotFound {
            link: LinkId::new("R1", "R9"),
        })
        .into();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "error": "Link R1-R9 not found in topology", "kind": "LinkNotFound" })
        );
    }

    #[test]
    fn test_bottleneck_issue_serialization() {
        assert_eq!(
            serde_json::to_value(BottleneckIssue::MtuMismatch).unwrap(),
            json!("MTU mismatch")
        );
        assert_eq!(BottleneckIssue::LowBandwidth.to_string(), "Low bandwidth");
    }
}
