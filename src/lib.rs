//! # Netsim - Network configuration analysis and what-if simulation
//!
//! This library turns router and switch configuration files into a device
//! topology and answers operational questions about it: is every device
//! reachable, which links are undersized, how much redundancy exists, and
//! what happens when a link or a VLAN fails.
//!
//! ## Overview
//!
//! The pipeline has four stages:
//!
//! - **Parse**: line-oriented configuration text becomes a [`device::Device`]
//! - **Infer**: devices are compared pairwise and linked when they share an
//!   IPv4 subnet (L3) or VLAN membership (L2)
//! - **Analyze**: validation, connectivity, bottlenecks and path redundancy
//! - **Simulate**: traffic paths, VLAN reachability, link and VLAN failures,
//!   bandwidth utilization and synthetic routing convergence
//!
//! Everything runs single-threaded over an in-memory graph. Failure
//! simulations work on a copy, so the topology a caller holds never changes.
//!
//! ## Architecture
//!
//! - `device`: configuration model and parser
//! - `topology`: graph type and link inference
//! - `analysis`: validation, performance, simulation and report export
//! - `settings`: YAML run settings
//! - `loader`: settings and device file loading
//! - `shell`: interactive command surface
//! - `utils`: IPv4 helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netsim::{loader, topology, analysis, settings::Settings};
//!
//! let devices = loader::load_devices(&["configs".into()])?;
//! let topology = topology::build_topology(&devices);
//!
//! let report = analysis::build_report(&devices, &topology, &Settings::default());
//! analysis::export_all(&report, &topology, "reports".as_ref())?;
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! Device files use an IOS-like syntax:
//!
//! ```text
//! hostname R1
//! interface GigabitEthernet0/0
//!  ip address 10.0.0.1 255.255.255.252
//!  mtu 1500
//!  bandwidth 1000000
//! router ospf 1
//!  network 10.0.0.0 0.0.0.3 area 0
//! ```
//!
//! ## Error Handling
//!
//! Domain errors are typed (`ParseError`, `SimulationError`, `SettingsError`);
//! file loading and export return `color_eyre` results with context.

pub mod analysis;
pub mod device;
pub mod loader;
pub mod settings;
pub mod shell;
pub mod topology;
pub mod utils;
