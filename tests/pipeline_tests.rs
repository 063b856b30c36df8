#[cfg(test)]
mod pipeline_tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    use netsim::analysis::{self, FailureStatus, QueryOutcome, Redundancy};
    use netsim::loader::{load_devices, load_settings};
    use netsim::topology::{build_topology, Link, LinkId};

    const R1: &str = include_str!("../configs/R1.txt");
    const R2: &str = include_str!("../configs/R2.txt");
    const SW1: &str = include_str!("../configs/SW1.txt");

    /// Write the sample inventory into a fresh directory
    fn sample_inventory() -> TempDir {
        let dir = TempDir::new().unwrap();
        // Written out of order; directory loading sorts by file name
        fs::write(dir.path().join("SW1.txt"), SW1).unwrap();
        fs::write(dir.path().join("R2.txt"), R2).unwrap();
        fs::write(dir.path().join("R1.txt"), R1).unwrap();
        dir
    }

    fn write_settings(dir: &Path, yaml: &str) -> PathBuf {
        let path = dir.join("netsim.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_sample_inventory_forms_triangle() {
        let inventory = sample_inventory();
        let devices = load_devices(&[inventory.path().to_path_buf()]).unwrap();
        let topology = build_topology(&devices);

        let order: Vec<&str> = topology.nodes().map(|n| n.hostname.as_str()).collect();
        assert_eq!(order, vec!["R1", "R2", "SW1"]);
        assert_eq!(topology.link_count(), 3);

        match topology.link("R1", "R2").unwrap() {
            Link::L3 { subnet, mtu, bandwidth } => {
                assert_eq!(subnet.to_string(), "10.0.0.0/30");
                assert_eq!(*mtu, (Some(1500), Some(1400)));
                assert_eq!(*bandwidth, (Some(1_000_000), Some(100_000)));
            }
            other => panic!("expected L3 link, got {:?}", other),
        }

        let trunk: Vec<u16> = topology.link("SW1", "R2").unwrap().vlans().collect();
        assert_eq!(trunk, vec![10, 20]);
    }

    #[test]
    fn test_full_report_from_settings() {
        let inventory = sample_inventory();
        let settings_path = write_settings(
            inventory.path(),
            r#"
scenarios:
  traffic:
    - { src: R1, dst: R2 }
    - { src: R2, dst: R9 }
  link_failures:
    - { link: [R1, R2], src: R1, dst: R2 }
    - { link: [R1, R9], src: R1, dst: R2 }
  vlan_failures:
    - { vlan: 10, link: [R1, SW1] }
    - { vlan: 30, link: [R1, SW1] }
"#,
        );
        let settings = load_settings(&settings_path).unwrap();

        // Only the device configs; the settings file lives alongside them
        let device_files = ["R1.txt", "R2.txt", "SW1.txt"].map(|name| inventory.path().join(name));
        let devices = load_devices(&device_files).unwrap();
        let topology = build_topology(&devices);
        let report = analysis::build_report(&devices, &topology, &settings);

        assert_eq!(
            report.validation,
            vec![
                "R1:GigabitEthernet0/1 has no IP",
                "R2:GigabitEthernet0/0 MTU below standard",
                "R2:GigabitEthernet0/0 Low bandwidth",
                "R2:GigabitEthernet0/1 has no IP",
            ]
        );

        assert!(report.performance.connected);
        assert_eq!(report.performance.bottlenecks.len(), 2);
        assert!(report
            .performance
            .redundancy
            .iter()
            .all(|(_, status)| *status == Redundancy::Redundant { paths: 2, capped: false }));

        assert_eq!(report.simulation.traffic[1].path, None);

        match &report.failure_simulation[0] {
            QueryOutcome::Completed(failure) => {
                assert_eq!(failure.status, FailureStatus::Rerouted);
                assert_eq!(
                    failure.new_path.as_deref(),
                    Some(&["R1".to_string(), "SW1".to_string(), "R2".to_string()][..])
                );
            }
            other => panic!("expected completed failure, got {:?}", other),
        }
        assert!(matches!(
            &report.failure_simulation[1],
            QueryOutcome::Rejected { kind: "LinkNotFound", .. }
        ));

        match &report.vlan_failure_simulation[0] {
            QueryOutcome::Completed(vlan_failure) => {
                let members = &vlan_failure.new_vlan_reachability[&10];
                assert!(!members.contains("R1"));
                assert_eq!(vlan_failure.removed_from, LinkId::new("R1", "SW1"));
            }
            other => panic!("expected completed VLAN failure, got {:?}", other),
        }
        assert!(matches!(
            &report.vlan_failure_simulation[1],
            QueryOutcome::Rejected { kind: "VlanNotOnLink", .. }
        ));

        // The canonical topology is untouched by any scenario
        assert_eq!(topology.link_count(), 3);
        assert_eq!(topology.link("R1", "SW1").unwrap().vlans().count(), 2);
    }

    #[test]
    fn test_export_all_writes_every_artifact() {
        let inventory = sample_inventory();
        let output = TempDir::new().unwrap();

        let devices = load_devices(&[inventory.path().to_path_buf()]).unwrap();
        let topology = build_topology(&devices);
        let report = analysis::build_report(&devices, &topology, &Default::default());
        let out_dir = output.path().join("reports");
        analysis::export_all(&report, &topology, &out_dir).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out_dir.join("network_report.json")).unwrap()).unwrap();
        assert_eq!(json["metadata"]["total_links"], 3);
        assert_eq!(json["route_convergence"]["OSPF"]["SW1"], 60);
        assert_eq!(json["performance"]["redundancy"]["R1-R2"], "2 paths available (redundant)");
        assert_eq!(json["bandwidth_utilization"]["R1-R2"]["util_percent"], 1000.0);
        assert_eq!(json["simulation"]["vlan_reachability"]["10"], serde_json::json!(["R1", "R2", "SW1"]));

        let traffic = fs::read_to_string(out_dir.join("traffic.csv")).unwrap();
        assert_eq!(traffic, "src,dst,path\nR1,R2,R1 -> R2\n");

        let vlan_sheet = fs::read_to_string(out_dir.join("vlan_failure_simulation.csv")).unwrap();
        assert_eq!(vlan_sheet, "empty\n");

        let reach = fs::read_to_string(out_dir.join("vlan_reachability.csv")).unwrap();
        assert!(reach.contains("10,\"R1, R2, SW1\""));

        let dot = fs::read_to_string(out_dir.join("network_topology.dot")).unwrap();
        assert!(dot.contains("\"R1\" -- \"R2\" [label=\"10.0.0.0/30\"];"));

        let text = fs::read_to_string(out_dir.join("report.txt")).unwrap();
        assert!(text.contains("NETWORK CONFIGURATION ANALYSIS"));
        assert!(text.contains("Traffic still possible (rerouted)"));
    }

    #[test]
    fn test_parse_error_names_file_and_line() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("R1.txt"), "hostname R1\ninterface Gi0/0\n mtu big\n").unwrap();

        let err = load_devices(&[dir.path().to_path_buf()]).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("R1.txt:3"), "unexpected error: {}", message);
    }
}
