//! Network topology module.
//!
//! This module infers an undirected device graph from parsed configurations
//! and exposes the graph type the analysis and simulation code runs on.

pub mod builder;
pub mod types;

// Re-export key types and functions for easier access
pub use builder::{build_topology, InferenceRule, RULE_ORDER};
pub use types::{DeviceNode, Link, LinkId, TopologyGraph};
