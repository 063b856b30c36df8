//! Interactive what-if shell over a loaded topology.
//!
//! Each command maps to one simulation call and renders its result as text.
//! A failed command prints an error and the loop keeps reading.

use std::io::{BufRead, Write};

use color_eyre::eyre::{Result, WrapErr};
use log::debug;

use crate::analysis::report::{bandwidth_rows, format_ms, format_path, format_table, vlan_rows};
use crate::analysis::{
    bandwidth_utilization, route_convergence, simulate_failure, simulate_traffic, simulate_vlan_failure,
    vlan_reachability, SimulationError,
};
use crate::device::parser::parse_vlan_id;
use crate::device::VlanId;
use crate::topology::{LinkId, TopologyGraph};

pub const PROMPT: &str = "netsim> ";

const HELP: &str = "\
Commands:
  simulate <src> <dst>           shortest path from src to dst
  vlan_reach                     devices reachable per VLAN
  fail <dev1> <dev2>             fail link dev1-dev2, re-route dev1 -> dev2
  vlan_fail <vlan> <dev1> <dev2> prune a VLAN from link dev1-dev2
  bw_util                        bandwidth utilization of L3 links
  ospf_conv                      synthetic OSPF convergence times
  bgp_conv                       synthetic BGP convergence times
  help                           show this message
  exit | quit                    leave the shell
";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Simulate { src: String, dst: String },
    VlanReach,
    Fail { link: LinkId },
    VlanFail { vlan: VlanId, link: LinkId },
    BandwidthUtil,
    OspfConvergence,
    BgpConvergence,
    Help,
    Exit,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid VLAN id '{0}'")]
    InvalidVlan(String),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

impl Command {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((verb, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let command = match (verb.to_ascii_lowercase().as_str(), args) {
            ("simulate", [src, dst]) => Command::Simulate {
                src: src.to_string(),
                dst: dst.to_string(),
            },
            ("simulate", _) => return Err(CommandError::Usage("simulate <src> <dst>")),
            ("vlan_reach", []) => Command::VlanReach,
            ("fail", [u, v]) => Command::Fail { link: LinkId::new(*u, *v) },
            ("fail", _) => return Err(CommandError::Usage("fail <dev1> <dev2>")),
            ("vlan_fail", [vlan, u, v]) => Command::VlanFail {
                vlan: parse_vlan_id(vlan).ok_or_else(|| CommandError::InvalidVlan(vlan.to_string()))?,
                link: LinkId::new(*u, *v),
            },
            ("vlan_fail", _) => return Err(CommandError::Usage("vlan_fail <vlan> <dev1> <dev2>")),
            ("bw_util", []) => Command::BandwidthUtil,
            ("ospf_conv", []) => Command::OspfConvergence,
            ("bgp_conv", []) => Command::BgpConvergence,
            ("help", _) => Command::Help,
            ("exit" | "quit", _) => Command::Exit,
            ("vlan_reach" | "bw_util" | "ospf_conv" | "bgp_conv", _) => {
                return Err(CommandError::Usage("this command takes no arguments"))
            }
            _ => return Err(CommandError::Unknown(verb.to_string())),
        };

        Ok(Some(command))
    }
}

/// Executes commands against a fixed topology
pub struct Shell<'a> {
    topology: &'a TopologyGraph,
}

impl<'a> Shell<'a> {
    pub fn new(topology: &'a TopologyGraph) -> Self {
        Self { topology }
    }

    /// Run a command and render its output
    pub fn execute(&self, command: &Command) -> Result<String, CommandError> {
        debug!("Executing {:?}", command);

        let output = match command {
            Command::Simulate { src, dst } => {
                let traffic = simulate_traffic(self.topology, src, dst);
                format!("Path {} -> {}: {}\n", src, dst, format_path(traffic.path.as_deref()))
            }
            Command::VlanReach => {
                format_table(&["VLAN", "Devices"], &vlan_rows(&vlan_reachability(self.topology)))
            }
            Command::Fail { link } => {
                let report = simulate_failure(self.topology, link, &link.u, &link.v)?;
                let mut out = format!("Link {} down: {}\n", report.failed_link, report.status);
                if let Some(path) = &report.new_path {
                    out.push_str(&format!("New path: {}\n", format_path(Some(path.as_slice()))));
                }
                out
            }
            Command::VlanFail { vlan, link } => {
                let report = simulate_vlan_failure(self.topology, *vlan, link)?;
                format!(
                    "VLAN {} removed from {}\n{}",
                    report.failed_vlan,
                    report.removed_from,
                    format_table(&["VLAN", "Devices"], &vlan_rows(&report.new_vlan_reachability))
                )
            }
            Command::BandwidthUtil => format_table(
                &["Link", "Actual (kbps)", "Max (kbps)", "Util %"],
                &bandwidth_rows(&bandwidth_utilization(self.topology)),
            ),
            Command::OspfConvergence => self.convergence("OSPF"),
            Command::BgpConvergence => self.convergence("BGP"),
            Command::Help => HELP.to_string(),
            Command::Exit => String::new(),
        };

        Ok(output)
    }

    fn convergence(&self, protocol: &str) -> String {
        let rows: Vec<Vec<String>> = route_convergence(self.topology, protocol)
            .into_iter()
            .map(|(host, ms)| vec![host, format_ms(ms)])
            .collect();
        format_table(&["Device", "Convergence (ms)"], &rows)
    }
}

/// Read commands from `input` until `exit`, `quit` or end of input
pub fn run<R: BufRead, W: Write>(topology: &TopologyGraph, input: R, mut output: W) -> Result<()> {
    let shell = Shell::new(topology);
    let mut lines = input.lines();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush().wrap_err("Failed to flush shell output")?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line.wrap_err("Failed to read shell input")?;

        match Command::parse(&line).and_then(|cmd| match cmd {
            Some(Command::Exit) => Ok(None),
            Some(cmd) => shell.execute(&cmd).map(Some),
            None => Ok(Some(String::new())),
        }) {
            Ok(Some(text)) => write!(output, "{}", text)?,
            Ok(None) => break,
            Err(err) => writeln!(output, "Error: {}", err)?,
        }
    }

    Ok(())
}
