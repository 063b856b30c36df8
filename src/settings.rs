use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::device::{VlanId, MAX_VLAN_ID};

/// Interfaces below this MTU are flagged
pub const DEFAULT_MIN_MTU: u32 = 1500;
/// Interfaces below this bandwidth (kbps) are flagged
pub const DEFAULT_MIN_BANDWIDTH_KBPS: u64 = 1_000_000;
/// Simple-path enumeration stops after this many paths per node pair
pub const DEFAULT_MAX_PATHS: usize = 100;

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Run settings, loaded from an optional YAML file
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    /// Device configuration files or directories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<PathBuf>,
    #[serde(default)]
    pub scenarios: Scenarios,
}

impl Settings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(SettingsError::InvalidGeneral(format!(
                    "log_level '{}' is not one of {}",
                    level,
                    LOG_LEVELS.join(", ")
                )));
            }
        }

        self.analysis.validate()?;
        self.scenarios.validate()?;

        Ok(())
    }
}

/// General run settings
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

/// Thresholds and bounds used by validation and performance analysis
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct AnalysisSettings {
    pub min_mtu: u32,
    pub min_bandwidth_kbps: u64,
    /// Path-count cap per node pair for redundancy analysis
    pub max_paths: usize,
    /// Optional cap on path length in hops for redundancy analysis
    pub max_path_hops: Option<usize>,
}

impl AnalysisSettings {
    fn validate(&self) -> Result<(), SettingsError> {
        // Redundancy needs to tell one path from two
        if self.max_paths < 2 {
            return Err(SettingsError::InvalidAnalysis(format!(
                "max_paths must be at least 2, got {}",
                self.max_paths
            )));
        }
        if self.max_path_hops == Some(0) {
            return Err(SettingsError::InvalidAnalysis(
                "max_path_hops must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_mtu: DEFAULT_MIN_MTU,
            min_bandwidth_kbps: DEFAULT_MIN_BANDWIDTH_KBPS,
            max_paths: DEFAULT_MAX_PATHS,
            max_path_hops: None,
        }
    }
}

/// What-if queries evaluated for the full report
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Scenarios {
    pub traffic: Vec<TrafficQuery>,
    pub link_failures: Vec<LinkFailureQuery>,
    pub vlan_failures: Vec<VlanFailureQuery>,
}

impl Scenarios {
    pub fn is_empty(&self) -> bool {
        self.traffic.is_empty() && self.link_failures.is_empty() && self.vlan_failures.is_empty()
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for query in &self.link_failures {
            validate_link(&query.link)?;
        }
        for query in &self.vlan_failures {
            validate_link(&query.link)?;
            if query.vlan > MAX_VLAN_ID {
                return Err(SettingsError::InvalidScenario(format!(
                    "VLAN {} is outside 0-{}",
                    query.vlan, MAX_VLAN_ID
                )));
            }
        }
        Ok(())
    }
}

fn validate_link(link: &[String; 2]) -> Result<(), SettingsError> {
    if link[0] == link[1] {
        return Err(SettingsError::InvalidScenario(format!(
            "link endpoints must differ, got {} twice",
            link[0]
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrafficQuery {
    pub src: String,
    pub dst: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LinkFailureQuery {
    pub link: [String; 2],
    pub src: String,
    pub dst: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VlanFailureQuery {
    pub vlan: VlanId,
    pub link: [String; 2],
}

/// Settings validation errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid general settings: {0}")]
    InvalidGeneral(String),
    #[error("Invalid analysis settings: {0}")]
    InvalidAnalysis(String),
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let yaml = r#"
general:
  log_level: debug
  output_dir: out
analysis:
  min_mtu: 9000
  max_paths: 10
  max_path_hops: 4
devices:
  - configs
  - extra/R9.txt
scenarios:
  traffic:
    - { src: R1, dst: R2 }
  link_failures:
    - { link: [R1, R2], src: R1, dst: R2 }
  vlan_failures:
    - { vlan: 10, link: [R1, SW1] }
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert!(settings.validate().is_ok());

        assert_eq!(settings.general.log_level.as_deref(), Some("debug"));
        assert_eq!(settings.analysis.min_mtu, 9000);
        // Unset fields fall back to defaults
        assert_eq!(settings.analysis.min_bandwidth_kbps, DEFAULT_MIN_BANDWIDTH_KBPS);
        assert_eq!(settings.analysis.max_path_hops, Some(4));
        assert_eq!(settings.devices.len(), 2);
        assert_eq!(settings.scenarios.link_failures[0].link, ["R1".to_string(), "R2".to_string()]);
        assert_eq!(settings.scenarios.vlan_failures[0].vlan, 10);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings: Settings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.scenarios.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<Settings, _> = serde_yaml::from_str("analysis:\n  min_mtu: 1500\n  colour: blue\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = Settings::default();
        settings.analysis.max_paths = 1;
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidAnalysis(_))));

        let mut settings = Settings::default();
        settings.analysis.max_path_hops = Some(0);
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidAnalysis(_))));

        let mut settings = Settings::default();
        settings.general.log_level = Some("chatty".to_string());
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidGeneral(_))));

        let mut settings = Settings::default();
        settings.scenarios.vlan_failures.push(VlanFailureQuery {
            vlan: 5000,
            link: ["R1".to_string(), "SW1".to_string()],
        });
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidScenario(_))));

        let mut settings = Settings::default();
        settings.scenarios.link_failures.push(LinkFailureQuery {
            link: ["R1".to_string(), "R1".to_string()],
            src: "R1".to_string(),
            dst: "R2".to_string(),
        });
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidScenario(_))));
    }
}
