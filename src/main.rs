use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::bail;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

use netsim::analysis::{self, NO_FINDINGS};
use netsim::device::Device;
use netsim::settings::Settings;
use netsim::topology::{build_topology, TopologyGraph};
use netsim::{loader, shell};

const DEFAULT_OUTPUT_DIR: &str = "netsim_output";

/// Topology inference and what-if analysis for router and switch configurations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the settings YAML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for reports
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Args, Debug)]
struct Inputs {
    /// Device configuration files or directories
    devices: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full analysis and export every report
    Report {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Check device configurations; exits non-zero when anything is found
    Validate {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Print the inferred topology
    Topology {
        #[command(flatten)]
        inputs: Inputs,

        /// Write a GraphViz DOT rendering to this file
        #[arg(long)]
        dot: Option<PathBuf>,
    },

    /// Start the interactive what-if shell
    Shell {
        #[command(flatten)]
        inputs: Inputs,
    },
}

impl Commands {
    fn inputs(&self) -> &Inputs {
        match self {
            Commands::Report { inputs }
            | Commands::Validate { inputs }
            | Commands::Topology { inputs, .. }
            | Commands::Shell { inputs } => inputs,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => loader::load_settings(path)?,
        None => Settings::default(),
    };

    // The settings file may choose the level, so the logger starts after it is read
    let log_level = resolve_log_level(cli.log_level.as_deref(), &settings);
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();
    if let Some(path) = &cli.config {
        info!("Loaded settings from {}", path.display());
    }

    let device_paths = resolve_device_paths(&cli.command.inputs().devices, &settings)?;
    let devices = loader::load_devices(&device_paths)?;

    match &cli.command {
        Commands::Report { .. } => {
            let output_dir = cli
                .output
                .clone()
                .or_else(|| settings.general.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
            run_report(&devices, &settings, &output_dir)?;
        }
        Commands::Validate { .. } => {
            let findings = analysis::validate_devices(&devices, &settings.analysis);
            if findings.is_empty() {
                println!("{}", NO_FINDINGS);
            } else {
                for finding in &findings {
                    println!("{}", finding);
                }
                std::process::exit(1);
            }
        }
        Commands::Topology { dot, .. } => {
            let topology = build_topology(&devices);
            print_topology(&topology);
            if let Some(path) = dot {
                analysis::report::write_dot(&topology, path)?;
            }
        }
        Commands::Shell { .. } => {
            let topology = build_topology(&devices);
            info!("Shell ready with {} devices, {} links", topology.node_count(), topology.link_count());
            shell::run(&topology, io::stdin().lock(), io::stdout().lock())?;
        }
    }

    Ok(())
}

/// CLI flag, then settings file, then "info"
fn resolve_log_level(cli_level: Option<&str>, settings: &Settings) -> String {
    cli_level
        .map(str::to_string)
        .or_else(|| settings.general.log_level.clone())
        .unwrap_or_else(|| "info".to_string())
}

/// Positional paths win over the settings file's device list
fn resolve_device_paths(cli_paths: &[PathBuf], settings: &Settings) -> Result<Vec<PathBuf>> {
    if !cli_paths.is_empty() {
        return Ok(cli_paths.to_vec());
    }
    if !settings.devices.is_empty() {
        return Ok(settings.devices.clone());
    }
    bail!("No device configurations given; pass paths or set 'devices' in the settings file")
}

fn run_report(devices: &[Device], settings: &Settings, output_dir: &Path) -> Result<()> {
    let topology = build_topology(devices);
    print_topology(&topology);

    let report = analysis::build_report(devices, &topology, settings);
    analysis::export_all(&report, &topology, output_dir)?;
    analysis::print_summary(&report);

    info!("Reports written to {}", output_dir.display());
    Ok(())
}

fn print_topology(topology: &TopologyGraph) {
    println!("Nodes:");
    for node in topology.nodes() {
        println!("  {} ({})", node.hostname, node.kind);
    }
    println!("Edges:");
    for (u, v, link) in topology.links() {
        println!("  {} - {}: {}", u, v, serde_json::to_string(link).unwrap_or_default());
    }
}
