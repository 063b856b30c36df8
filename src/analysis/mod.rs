//! Analysis and what-if simulation over inferred topologies.
//!
//! This module provides device validation, performance auditing (connectivity,
//! bottlenecks, path redundancy), failure simulation and report export.

pub mod types;
pub mod validation;
pub mod performance;
pub mod simulation;
pub mod report;

pub use types::*;
pub use validation::validate_devices;
pub use performance::{analyze_performance, analyze_redundancy, find_bottlenecks};
pub use simulation::{
    bandwidth_utilization, route_convergence, shortest_path, simulate_failure, simulate_traffic,
    simulate_vlan_failure, vlan_reachability, ConvergenceProtocol, SimulationError,
};
pub use report::{build_report, export_all, export_csv, generate_dot, generate_json_report, generate_text_report, print_summary};
