//! hvdetectctl - CLI for the Linux virtualization detector
//!
//! Prints the detected hypervisor, the published facts, or every probe's
//! individual answer.

use anyhow::Result;
use clap::{Parser, Subcommand};
use hvdetect_common::facts::{FactCollection, Facts};
use hvdetect_common::{
    DetectorConfig, Evidence, Probe, VirtualizationDetector, VirtualizationResolver,
};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hvdetectctl")]
#[command(about = "Detect the hypervisor or container runtime hosting this system", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/hvdetect/config.toml, then /etc/hvdetect/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Inspect a filesystem tree mounted here instead of /
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Skip a probe (repeatable)
    #[arg(long = "disable", global = true)]
    disabled: Vec<Probe>,

    /// Seed a previously resolved fact, e.g. --fact gce=true (repeatable)
    #[arg(long = "fact", global = true, value_name = "NAME=VALUE", value_parser = parse_fact)]
    facts: Vec<(String, serde_json::Value)>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected hypervisor, or "physical"
    Detect {
        /// Print the full detection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the virtualization facts as JSON
    Facts,

    /// Run every probe and print each result
    Probes,
}

#[derive(Serialize)]
struct DetectReport<'a> {
    hypervisor: &'a str,
    #[serde(rename = "virtual")]
    virtual_name: &'a str,
    is_virtual: bool,
    probe: Option<Probe>,
    detected_at: chrono::DateTime<chrono::Utc>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = DetectorConfig::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    config.disabled_probes.extend(cli.disabled);
    debug!("Using config: {:?}", config);

    let detector = VirtualizationDetector::from_config(&config);
    let mut seeded = Facts::new();
    for (name, value) in cli.facts {
        seeded.add(&name, value);
    }

    let output = match cli.command {
        Commands::Detect { json } => render_detect(detector, seeded, json)?,
        Commands::Facts => render_facts(detector, seeded)?,
        Commands::Probes => render_table(&detector, &seeded),
    };
    println!("{}", output);
    Ok(())
}

/// `name=value`; the value is JSON when it parses as JSON, a string otherwise
fn parse_fact(arg: &str) -> Result<(String, serde_json::Value)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected NAME=VALUE, got '{}'", arg))?;
    if name.is_empty() {
        anyhow::bail!("Fact name must not be empty");
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn render_detect<E: Evidence>(
    detector: VirtualizationDetector<E>,
    mut facts: Facts,
    json: bool,
) -> Result<String> {
    let resolver = VirtualizationResolver::new(detector);
    let data = resolver.resolve(&mut facts);

    if !json {
        return Ok(data.virtual_name);
    }
    let report = DetectReport {
        hypervisor: &data.hypervisor,
        virtual_name: &data.virtual_name,
        is_virtual: data.is_virtual,
        probe: data.probe,
        detected_at: chrono::Utc::now(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_facts<E: Evidence>(
    detector: VirtualizationDetector<E>,
    mut facts: Facts,
) -> Result<String> {
    let resolver = VirtualizationResolver::new(detector);
    resolver.resolve(&mut facts);
    Ok(serde_json::to_string_pretty(&facts)?)
}

fn render_table<E: Evidence>(detector: &VirtualizationDetector<E>, facts: &Facts) -> String {
    let results = detector.run_all(facts);
    if results.is_empty() {
        return "All probes disabled".yellow().to_string();
    }
    let winner = results.iter().find(|(_, result)| !result.is_empty());

    let mut lines = Vec::with_capacity(results.len());
    for (probe, result) in &results {
        let marker = match winner {
            Some((winning, _)) if winning == probe => "*",
            _ => " ",
        };
        let shown = if result.is_empty() {
            "-".dimmed().to_string()
        } else {
            result.green().to_string()
        };
        lines.push(format!("{} {:<14} {}", marker, probe.as_str(), shown));
    }
    lines.join("\n")
}
