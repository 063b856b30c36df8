//! Report assembly and export.
//!
//! Builds the full [`NetworkReport`] and writes it as JSON, a human-readable
//! text report, CSV sheets and a GraphViz DOT rendering of the topology.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use log::info;

use super::performance::analyze_performance;
use super::simulation::*;
use super::types::*;
use super::validation::validate_devices;
use crate::device::{Device, DeviceKind};
use crate::settings::{LinkFailureQuery, Scenarios, Settings, TrafficQuery};
use crate::topology::{Link, LinkId, TopologyGraph};

pub const JSON_REPORT_FILE: &str = "network_report.json";
pub const TEXT_REPORT_FILE: &str = "report.txt";
pub const DOT_FILE: &str = "network_topology.dot";

/// Run validation, performance analysis and every configured scenario
pub fn build_report(devices: &[Device], topology: &TopologyGraph, settings: &Settings) -> NetworkReport {
    let scenarios = effective_scenarios(topology, &settings.scenarios);

    let validation = validate_devices(devices, &settings.analysis);
    let performance = analyze_performance(topology, &settings.analysis);

    let traffic = scenarios
        .traffic
        .iter()
        .map(|query| simulate_traffic(topology, &query.src, &query.dst))
        .collect();

    let failure_simulation: Vec<QueryOutcome<FailureReport>> = scenarios
        .link_failures
        .iter()
        .map(|query| {
            let link = LinkId::new(&query.link[0], &query.link[1]);
            simulate_failure(topology, &link, &query.src, &query.dst).into()
        })
        .collect();

    let vlan_failure_simulation: Vec<QueryOutcome<VlanFailureReport>> = scenarios
        .vlan_failures
        .iter()
        .map(|query| {
            let link = LinkId::new(&query.link[0], &query.link[1]);
            simulate_vlan_failure(topology, query.vlan, &link).into()
        })
        .collect();

    let routers = topology.nodes().filter(|n| n.kind == DeviceKind::Router).count();

    NetworkReport {
        metadata: ReportMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_devices: topology.node_count(),
            routers,
            switches: topology.node_count() - routers,
            total_links: topology.link_count(),
        },
        validation,
        performance,
        simulation: SimulationSection {
            traffic,
            vlan_reachability: vlan_reachability(topology),
        },
        failure_simulation,
        vlan_failure_simulation,
        bandwidth_utilization: bandwidth_utilization(topology),
        route_convergence: ConvergenceSection {
            ospf: route_convergence(topology, "OSPF"),
            bgp: route_convergence(topology, "BGP"),
        },
    }
}

/// Configured scenarios, or traffic between the first two nodes (and the
/// failure of their link, if any) when none are configured
fn effective_scenarios(topology: &TopologyGraph, configured: &Scenarios) -> Scenarios {
    if !configured.is_empty() {
        return configured.clone();
    }

    let mut nodes = topology.nodes();
    let (Some(first), Some(second)) = (nodes.next(), nodes.next()) else {
        return Scenarios::default();
    };
    let (src, dst) = (first.hostname.clone(), second.hostname.clone());

    let mut scenarios = Scenarios::default();
    if topology.link(&src, &dst).is_some() {
        scenarios.link_failures.push(LinkFailureQuery {
            link: [src.clone(), dst.clone()],
            src: src.clone(),
            dst: dst.clone(),
        });
    }
    scenarios.traffic.push(TrafficQuery { src, dst });
    scenarios
}

/// Generate JSON report
pub fn generate_json_report(report: &NetworkReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Generate human-readable text report
pub fn generate_text_report(report: &NetworkReport, output_path: &Path) -> Result<()> {
    fs::write(output_path, render_text_report(report))
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    info!("Text report written to {}", output_path.display());
    Ok(())
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push("=".repeat(80));
    lines.push(format!("{:^80}", title));
    lines.push("=".repeat(80));
    lines.push(String::new());
}

pub fn render_text_report(report: &NetworkReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    section(&mut lines, "NETWORK CONFIGURATION ANALYSIS");
    lines.push(format!("Generated: {}", report.metadata.generated_at));
    lines.push(format!(
        "Devices: {} ({} routers, {} switches)",
        report.metadata.total_devices, report.metadata.routers, report.metadata.switches
    ));
    lines.push(format!("Links: {}", report.metadata.total_links));
    lines.push(String::new());

    section(&mut lines, "VALIDATION");
    if report.validation.is_empty() {
        lines.push(NO_FINDINGS.to_string());
    } else {
        lines.extend(report.validation.iter().map(|finding| format!("  - {}", finding)));
    }
    lines.push(String::new());

    section(&mut lines, "PERFORMANCE");
    let performance = &report.performance;
    lines.push(format!(
        "Connectivity: {}",
        if performance.connected { "connected" } else { "PARTITIONED" }
    ));
    lines.push(String::new());
    lines.push("Bottlenecks:".to_string());
    if performance.bottlenecks.is_empty() {
        lines.push("  none".to_string());
    }
    for b in &performance.bottlenecks {
        lines.push(format!("  {}-{}: {}", b.node_u, b.node_v, b.issue));
    }
    lines.push(String::new());
    lines.push("Redundancy:".to_string());
    lines.push(format_table(&["Pair", "Status"], &redundancy_rows(&performance.redundancy)));

    section(&mut lines, "SIMULATION");
    lines.push(format_table(&["Source", "Destination", "Path"], &traffic_rows(&report.simulation.traffic)));
    lines.push("VLAN reachability:".to_string());
    lines.push(format_table(&["VLAN", "Devices"], &vlan_rows(&report.simulation.vlan_reachability)));

    section(&mut lines, "FAILURE SIMULATION");
    for outcome in &report.failure_simulation {
        match outcome {
            QueryOutcome::Completed(f) => {
                lines.push(format!("Link {} down, {} -> {}: {}", f.failed_link, f.src, f.dst, f.status));
                if let Some(path) = &f.new_path {
                    lines.push(format!("  New path: {}", format_path(Some(path.as_slice()))));
                }
            }
            QueryOutcome::Rejected { error, .. } => lines.push(format!("Error: {}", error)),
        }
    }
    for outcome in &report.vlan_failure_simulation {
        match outcome {
            QueryOutcome::Completed(f) => {
                lines.push(format!("VLAN {} removed from {}:", f.failed_vlan, f.removed_from));
                lines.push(format_table(&["VLAN", "Devices"], &vlan_rows(&f.new_vlan_reachability)));
            }
            QueryOutcome::Rejected { error, .. } => lines.push(format!("Error: {}", error)),
        }
    }
    lines.push(String::new());

    section(&mut lines, "BANDWIDTH AND CONVERGENCE");
    lines.push(format_table(
        &["Link", "Actual (kbps)", "Max (kbps)", "Util %"],
        &bandwidth_rows(&report.bandwidth_utilization),
    ));
    lines.push(format_table(
        &["Device", "OSPF (ms)", "BGP (ms)"],
        &convergence_rows(&report.route_convergence),
    ));

    lines.join("\n")
}

/// Print a short summary to stdout
pub fn print_summary(report: &NetworkReport) {
    println!("\n=== NETWORK ANALYSIS SUMMARY ===\n");
    println!(
        "Devices: {} ({} routers, {} switches)",
        report.metadata.total_devices, report.metadata.routers, report.metadata.switches
    );
    println!("Links: {}", report.metadata.total_links);
    println!("Connected: {}", report.performance.connected);
    println!("Validation findings: {}", report.validation.len());
    println!("Bottlenecks: {}", report.performance.bottlenecks.len());

    for traffic in &report.simulation.traffic {
        println!("Traffic {} -> {}: {}", traffic.src, traffic.dst, format_path(traffic.path.as_deref()));
    }
    for outcome in &report.failure_simulation {
        if let QueryOutcome::Completed(f) = outcome {
            println!("Failure of {}: {}", f.failed_link, f.status);
        }
    }
    println!();
}

/// Render a path as `A -> B -> C`
pub fn format_path(path: Option<&[String]>) -> String {
    match path {
        Some(hops) => hops.join(" -> "),
        None => "No path".to_string(),
    }
}

/// Render rows as a left-aligned text table with a header rule
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "  (none)\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = table_line(headers, &widths);
    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&format!("  {}\n", "-".repeat(total)));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&table_line(&cells, &widths));
    }
    out
}

fn table_line(cells: &[&str], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    format!("  {}\n", line.trim_end())
}

pub fn redundancy_rows(redundancy: &RedundancyReport) -> Vec<Vec<String>> {
    redundancy
        .iter()
        .map(|(pair, status)| vec![pair.to_string(), status.to_string()])
        .collect()
}

pub fn traffic_rows(traffic: &[TrafficReport]) -> Vec<Vec<String>> {
    traffic
        .iter()
        .map(|t| vec![t.src.clone(), t.dst.clone(), format_path(t.path.as_deref())])
        .collect()
}

pub fn vlan_rows(reachability: &VlanReachability) -> Vec<Vec<String>> {
    reachability
        .iter()
        .map(|(vlan, hosts)| {
            vec![vlan.to_string(), hosts.iter().cloned().collect::<Vec<_>>().join(", ")]
        })
        .collect()
}

pub fn bandwidth_rows(utilization: &BandwidthReport) -> Vec<Vec<String>> {
    utilization
        .iter()
        .map(|(link, u)| {
            vec![
                link.to_string(),
                u.actual_kbps.to_string(),
                u.max_kbps.to_string(),
                format!("{:.2}", u.util_percent),
            ]
        })
        .collect()
}

fn convergence_rows(convergence: &ConvergenceSection) -> Vec<Vec<String>> {
    convergence
        .ospf
        .iter()
        .zip(&convergence.bgp)
        .map(|((host, ospf), (_, bgp))| vec![host.clone(), format_ms(*ospf), format_ms(*bgp)])
        .collect()
}

pub fn format_ms(value: Option<u64>) -> String {
    value.map_or_else(|| "null".to_string(), |ms| ms.to_string())
}

/// Quote a CSV field when it contains a separator, quote or line break
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_csv(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let content = if rows.is_empty() {
        "empty\n".to_string()
    } else {
        let mut out = headers.join(",");
        out.push('\n');
        for row in rows {
            let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    };

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write one CSV sheet per report section into `output_dir`
pub fn export_csv(report: &NetworkReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut failure_rows = Vec::new();
    for outcome in &report.failure_simulation {
        failure_rows.push(match outcome {
            QueryOutcome::Completed(f) => vec![
                f.failed_link.to_string(),
                f.src.clone(),
                f.dst.clone(),
                f.status.to_string(),
                format_path(f.new_path.as_deref()),
                String::new(),
            ],
            QueryOutcome::Rejected { error, .. } => {
                vec![String::new(), String::new(), String::new(), String::new(), String::new(), error.clone()]
            }
        });
    }

    let mut vlan_failure_rows = Vec::new();
    let mut vlan_failure_reach_rows = Vec::new();
    for outcome in &report.vlan_failure_simulation {
        match outcome {
            QueryOutcome::Completed(f) => {
                vlan_failure_rows.push(vec![f.failed_vlan.to_string(), f.removed_from.to_string(), String::new()]);
                for row in vlan_rows(&f.new_vlan_reachability) {
                    let mut full = vec![f.failed_vlan.to_string(), f.removed_from.to_string()];
                    full.extend(row);
                    vlan_failure_reach_rows.push(full);
                }
            }
            QueryOutcome::Rejected { error, .. } => {
                vlan_failure_rows.push(vec![String::new(), String::new(), error.clone()]);
            }
        }
    }

    let bottleneck_rows: Vec<Vec<String>> = report
        .performance
        .bottlenecks
        .iter()
        .map(|b| vec![b.node_u.clone(), b.node_v.clone(), b.issue.to_string()])
        .collect();
    let validation_rows: Vec<Vec<String>> = report.validation.iter().map(|f| vec![f.clone()]).collect();

    let mut written = Vec::new();
    let mut sheet = |name: &str, headers: &[&str], rows: Vec<Vec<String>>| -> Result<()> {
        let path = output_dir.join(name);
        write_csv(&path, headers, &rows)?;
        written.push(path);
        Ok(())
    };

    sheet("validation.csv", &["finding"], validation_rows)?;
    sheet("bottlenecks.csv", &["node_u", "node_v", "issue"], bottleneck_rows)?;
    sheet("redundancy.csv", &["pair", "status"], redundancy_rows(&report.performance.redundancy))?;
    sheet("traffic.csv", &["src", "dst", "path"], traffic_rows(&report.simulation.traffic))?;
    sheet(
        "vlan_reachability.csv",
        &["vlan", "devices"],
        vlan_rows(&report.simulation.vlan_reachability),
    )?;
    sheet(
        "failure_simulation.csv",
        &["failed_link", "src", "dst", "status", "new_path", "error"],
        failure_rows,
    )?;
    sheet(
        "vlan_failure_simulation.csv",
        &["failed_vlan", "removed_from", "error"],
        vlan_failure_rows,
    )?;
    sheet(
        "vlan_failure_reachability.csv",
        &["failed_vlan", "removed_from", "vlan", "devices"],
        vlan_failure_reach_rows,
    )?;
    sheet(
        "bandwidth_utilization.csv",
        &["link", "actual_kbps", "max_kbps", "util_percent"],
        bandwidth_rows(&report.bandwidth_utilization),
    )?;

    info!("{} CSV sheets written to {}", written.len(), output_dir.display());
    Ok(written)
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Generate GraphViz DOT format for visualization
pub fn generate_dot(topology: &TopologyGraph) -> String {
    let mut dot = String::new();
    dot.push_str("graph Network {\n");
    dot.push_str("    node [style=filled];\n\n");

    for node in topology.nodes() {
        let (shape, color) = match node.kind {
            DeviceKind::Router => ("box", "lightblue"),
            DeviceKind::Switch => ("ellipse", "lightgreen"),
        };
        dot.push_str(&format!(
            "    \"{}\" [shape={}, fillcolor={}];\n",
            dot_escape(&node.hostname),
            shape,
            color
        ));
    }

    dot.push('\n');

    for (u, v, link) in topology.links() {
        let attrs = match link {
            Link::L3 { subnet, .. } => format!("label=\"{}\"", subnet),
            Link::L2 { .. } => {
                let vlans: Vec<String> = link.vlans().map(|v| v.to_string()).collect();
                format!("style=dashed, label=\"VLANs: {}\"", vlans.join(","))
            }
        };
        dot.push_str(&format!("    \"{}\" -- \"{}\" [{}];\n", dot_escape(u), dot_escape(v), attrs));
    }

    dot.push_str("}\n");
    dot
}

pub fn write_dot(topology: &TopologyGraph, output_path: &Path) -> Result<()> {
    fs::write(output_path, generate_dot(topology))
        .with_context(|| format!("Failed to write DOT file to {}", output_path.display()))?;

    info!("Topology diagram written to {}", output_path.display());
    Ok(())
}

/// Write every export into `output_dir`, creating it if needed
pub fn export_all(report: &NetworkReport, topology: &TopologyGraph, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    generate_json_report(report, &output_dir.join(JSON_REPORT_FILE))?;
    generate_text_report(report, &output_dir.join(TEXT_REPORT_FILE))?;
    export_csv(report, output_dir)?;
    write_dot(topology, &output_dir.join(DOT_FILE))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::parse_device;
    use crate::settings::VlanFailureQuery;
    use crate::topology::build_topology;

    fn sample() -> (Vec<Device>, TopologyGraph) {
        let devices = vec![
            parse_device(
                "hostname R1\n\
                 interface Gi0/0\n ip address 10.0.0.1 255.255.255.252\n bandwidth 100000\n",
            )
            .unwrap(),
            parse_device(
                "hostname R2\n\
                 interface Gi0/0\n ip address 10.0.0.2 255.255.255.252\n bandwidth 1000000\n",
            )
            .unwrap(),
            parse_device(
                "hostname SW1\nvlan 10\nvlan 20\n\
                 interface Gi0/1\n switchport mode trunk\n switchport trunk allowed vlan 10,20\n",
            )
            .unwrap(),
        ];
        let topology = build_topology(&devices);
        (devices, topology)
    }

    #[test]
    fn test_default_scenarios_use_first_two_nodes() {
        let (devices, topology) = sample();
        let report = build_report(&devices, &topology, &Settings::default());

        assert_eq!(report.simulation.traffic.len(), 1);
        assert_eq!(report.simulation.traffic[0].path, Some(vec!["R1".to_string(), "R2".to_string()]));
        assert_eq!(report.failure_simulation.len(), 1);
        assert!(report.vlan_failure_simulation.is_empty());
        assert_eq!(report.metadata.routers, 2);
        assert_eq!(report.metadata.switches, 1);
    }

    #[test]
    fn test_report_json_shape() {
        let (devices, topology) = sample();
        let mut settings = Settings::default();
        settings.analysis.min_bandwidth_kbps = 10_000;
        settings.scenarios.vlan_failures.push(VlanFailureQuery {
            vlan: 99,
            link: ["R1".to_string(), "R2".to_string()],
        });

        let report = build_report(&devices, &topology, &settings);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["validation"], serde_json::json!(NO_FINDINGS));
        assert_eq!(json["route_convergence"]["OSPF"]["R1"], 50);
        assert_eq!(json["route_convergence"]["BGP"]["SW1"], 240);
        assert_eq!(json["vlan_failure_simulation"][0]["kind"], "VlanNotOnLink");
        assert_eq!(json["bandwidth_utilization"]["R1-R2"]["util_percent"], 10.0);
        // Only configured scenarios run once any are given
        assert_eq!(json["simulation"]["traffic"], serde_json::json!([]));
    }

    #[test]
    fn test_dot_output() {
        let (_, topology) = sample();
        let dot = generate_dot(&topology);

        assert!(dot.starts_with("graph Network {"));
        assert!(dot.contains("\"R1\" [shape=box, fillcolor=lightblue];"));
        assert!(dot.contains("\"SW1\" [shape=ellipse, fillcolor=lightgreen];"));
        assert!(dot.contains("\"R1\" -- \"R2\" [label=\"10.0.0.0/30\"];"));
        assert!(dot.contains("style=dashed, label=\"VLANs: 10,20\""));
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("10, 20"), "\"10, 20\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_format_table() {
        let table = format_table(&["Pair", "Status"], &[vec!["A-B".to_string(), "No path".to_string()]]);
        assert_eq!(table, "  Pair  Status\n  -------------\n  A-B   No path\n");
        assert_eq!(format_table(&["Pair"], &[]), "  (none)\n");
    }
}
