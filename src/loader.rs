use crate::device::{parse_device_named, Device};
use crate::settings::Settings;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use log::{debug, info};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Load and validate run settings from a YAML file
pub fn load_settings(path: &Path) -> Result<Settings> {
    let file = File::open(path).wrap_err_with(|| format!("Failed to open settings file '{}'", path.display()))?;
    let settings: Settings = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse settings file '{}'", path.display()))?;

    settings.validate()?;

    Ok(settings)
}

/// Read and parse one device configuration file
pub fn load_device(path: &Path) -> Result<Device> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read device config '{}'", path.display()))?;

    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let device = parse_device_named(&source, &text)?;
    debug!("Parsed {} from {} ({} interfaces)", device.hostname, source, device.interfaces.len());
    Ok(device)
}

/// Load devices from files and directories, preserving argument order
pub fn load_devices(paths: &[PathBuf]) -> Result<Vec<Device>> {
    let files = collect_config_files(paths)?;
    if files.is_empty() {
        bail!("No device configuration files found in {:?}", paths);
    }

    let devices = files.iter().map(|path| load_device(path)).collect::<Result<Vec<_>>>()?;
    info!("Loaded {} device configurations", devices.len());
    Ok(devices)
}

/// Expand directories to their regular, non-hidden files in sorted order
pub fn collect_config_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).wrap_err_with(|| format!("Failed to list directory '{}'", path.display()))? {
            let entry = entry?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.file_type()?.is_file() {
                entries.push(entry.path());
            }
        }
        entries.sort();
        files.extend(entries);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_config_files_sorts_and_skips_hidden() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("SW1.txt"), "hostname SW1\n").unwrap();
        fs::write(dir.path().join("R1.txt"), "hostname R1\n").unwrap();
        fs::write(dir.path().join(".swap"), "junk").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = collect_config_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["R1.txt", "SW1.txt"]);
    }

    #[test]
    fn test_load_device_reports_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("R1.cfg");
        fs::write(&path, "interface Gi0/0\n").unwrap();

        let err = load_device(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("R1.cfg"));
    }

    #[test]
    fn test_load_devices_requires_files() {
        let dir = TempDir::new().unwrap();
        assert!(load_devices(&[dir.path().to_path_buf()]).is_err());
        assert!(load_devices(&[dir.path().join("missing.txt")]).is_err());
    }

    #[test]
    fn test_load_settings_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netsim.yaml");
        fs::write(&path, "analysis:\n  max_paths: 1\n").unwrap();
        assert!(load_settings(&path).is_err());

        fs::write(&path, "analysis:\n  min_mtu: 9000\n").unwrap();
        assert_eq!(load_settings(&path).unwrap().analysis.min_mtu, 9000);
    }
}
