//! Per-device configuration checks.
//!
//! Findings are plain strings of the form `<host>:<interface> <problem>`.
//! An empty list means the inventory is clean.

use log::info;

use crate::device::Device;
use crate::settings::AnalysisSettings;

/// Check every interface of every device against the configured thresholds.
///
/// Checks for:
/// - Router interfaces without an IP address (switches are exempt)
/// - MTU below `min_mtu`
/// - Bandwidth below `min_bandwidth_kbps`
pub fn validate_devices(devices: &[Device], thresholds: &AnalysisSettings) -> Vec<String> {
    let mut findings = Vec::new();

    for device in devices {
        let is_router = !device.is_switch();

        for iface in &device.interfaces {
            let label = format!("{}:{}", device.hostname, iface.name);

            if is_router && iface.ip.is_none() {
                findings.push(format!("{} has no IP", label));
            }

            if iface.mtu.is_some_and(|mtu| mtu < thresholds.min_mtu) {
                findings.push(format!("{} MTU below standard", label));
            }

            if iface.bandwidth.is_some_and(|bw| bw < thresholds.min_bandwidth_kbps) {
                findings.push(format!("{} Low bandwidth", label));
            }
        }
    }

    info!("Validation produced {} findings across {} devices", findings.len(), devices.len());
    findings
}
