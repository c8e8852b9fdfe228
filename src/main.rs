//! `launch-policy` CLI entry point.
//!
//! Provides `compile` and `verify` subcommands for inspecting an image's
//! launch policy and checking an operator launch spec against it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use launch_policy::config::Config;
use launch_policy::{LaunchPolicy, LaunchSpec, PolicyViolation};

/// launch-policy — image-label launch policy compiler and spec verifier.
#[derive(Parser)]
#[command(name = "launch-policy", version, about)]
struct Cli {
    /// Config file (default: `$LAUNCH_POLICY_CONFIG` or `~/.launch-policy/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Image label sources shared by every subcommand.
#[derive(clap::Args)]
struct LabelArgs {
    /// JSON file holding an object of image labels.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Single image label as `KEY=VALUE`; wins over `--labels`.
    #[arg(long = "label", value_parser = parse_label)]
    label: Vec<(String, String)>,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Compile image labels and print the launch policy as JSON.
    Compile {
        #[command(flatten)]
        labels: LabelArgs,
    },
    /// Verify a launch spec against the policy compiled from image labels.
    Verify {
        #[command(flatten)]
        labels: LabelArgs,

        /// JSON file holding the launch spec.
        #[arg(long)]
        spec: PathBuf,

        /// Verify as a debug environment regardless of configuration.
        #[arg(long)]
        debug: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    launch_policy::logging::init_cli(&config.logging)?;

    match cli.command {
        Command::Compile { labels } => handle_compile(&labels),
        Command::Verify {
            labels,
            spec,
            debug,
        } => handle_verify(&config, &labels, &spec, debug),
    }
}

/// Print the compiled policy.
fn handle_compile(args: &LabelArgs) -> anyhow::Result<ExitCode> {
    let policy = compile_labels(args)?;
    let json = serde_json::to_string_pretty(&policy).context("failed to serialize policy")?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

/// Verify a launch spec; a policy violation exits with status 1.
fn handle_verify(
    config: &Config,
    args: &LabelArgs,
    spec_path: &Path,
    force_debug: bool,
) -> anyhow::Result<ExitCode> {
    let policy = compile_labels(args)?;
    info!(policy = %policy, "launch policy compiled");

    let mut spec: LaunchSpec = read_json(spec_path)?;
    spec.hardened = config.launcher.hardened && !force_debug;
    debug!(hardened = spec.hardened, mounts = spec.mounts.len(), "verifying launch spec");

    match policy.verify(&spec) {
        Ok(()) => {
            println!("launch spec allowed");
            Ok(ExitCode::SUCCESS)
        }
        Err(violation) => {
            report_violation(&violation);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_violation(violation: &PolicyViolation) {
    match violation {
        PolicyViolation::Mounts(mounts) => {
            eprintln!(
                "launch spec rejected ({}): destination mount points are not allowed",
                violation.rule()
            );
            for mount in mounts {
                eprintln!("  {mount}");
            }
        }
        other => eprintln!("launch spec rejected ({}): {other}", other.rule()),
    }
}

/// Merge label sources and compile them.
fn compile_labels(args: &LabelArgs) -> anyhow::Result<LaunchPolicy> {
    let mut image_labels: HashMap<String, String> = match &args.labels {
        Some(path) => read_json(path)?,
        None => HashMap::new(),
    };
    image_labels.extend(args.label.iter().cloned());

    LaunchPolicy::from_labels(&image_labels).context("image labels do not form a valid launch policy")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_label(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))
}
