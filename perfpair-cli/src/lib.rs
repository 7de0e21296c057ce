#![warn(missing_docs)]
//! perfpair CLI Library
//!
//! Command-line front end for the benchmark suites. `perfpair::run()` (or
//! `perfpair_cli::run()`) parses arguments, layers them over `perfpair.toml`,
//! probes optional capabilities once and runs the selected suites in order.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     perfpair_cli::run()
//! }
//! ```

mod config;
mod planner;

pub use config::*;
pub use planner::{ALL_SUITES, RunPlan, build_plan};

use anyhow::Context;
use clap::{Parser, Subcommand};
use perfpair_core::{
    Capabilities, ConsoleReporter, JsonReporter, Reporter, RunSummary, Runner, pin_to_cpu,
};
use regex::Regex;
use std::fmt::Write as _;
use std::path::PathBuf;

/// perfpair CLI arguments
#[derive(Parser, Debug)]
#[command(name = "perfpair")]
#[command(
    author,
    version,
    about = "perfpair - naive versus optimized implementations, timed side by side"
)]
pub struct Cli {
    /// Optional subcommand (List, Run, Config); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Suite to run: all, data, systems, vision
    #[arg(default_value = ALL_SUITES)]
    pub suite: String,

    /// Run only groups whose id matches this regex
    #[arg(long, default_value = ".*")]
    pub filter: String,

    /// Output format: human, json (overrides perfpair.toml)
    #[arg(long)]
    pub format: Option<String>,

    /// Pin the runner thread to this CPU (Linux only)
    #[arg(long)]
    pub pin_cpu: Option<usize>,

    /// Treat a capability as unavailable (repeatable)
    #[arg(long = "disable", value_name = "CAPABILITY")]
    pub disable: Vec<String>,

    /// Detection model weights (overrides perfpair.toml)
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// List the groups that would run
    List,
    /// Run the selected suites (default)
    Run,
    /// Print a default perfpair.toml
    Config,
}

/// Effective settings after layering CLI flags over the config file
#[derive(Debug, Clone)]
pub struct Settings {
    /// Suite selector
    pub suite: String,
    /// Group id filter
    pub filter: Regex,
    /// Report format
    pub format: OutputFormat,
    /// CPU to pin the runner to
    pub pin_cpu: Option<usize>,
    /// Capabilities forced unavailable
    pub disabled: Vec<String>,
    /// Detection model weights
    pub model_path: PathBuf,
}

impl Settings {
    /// Layer `cli` over `config`: CLI flags win, the file fills the rest.
    pub fn resolve(cli: &Cli, config: &PerfConfig) -> anyhow::Result<Self> {
        if cli.suite != ALL_SUITES && !perfpair_suites::SUITE_IDS.contains(&cli.suite.as_str()) {
            anyhow::bail!(
                "unknown suite '{}' (expected {}, {})",
                cli.suite,
                ALL_SUITES,
                perfpair_suites::SUITE_IDS.join(", ")
            );
        }

        let filter = Regex::new(&cli.filter)
            .with_context(|| format!("invalid --filter pattern '{}'", cli.filter))?;

        let format = match &cli.format {
            Some(name) => name.parse()?,
            None => config.output.format,
        };

        let mut disabled = config.capabilities.disable.clone();
        for name in &cli.disable {
            if !disabled.contains(name) {
                disabled.push(name.clone());
            }
        }

        Ok(Self {
            suite: cli.suite.clone(),
            filter,
            format,
            pin_cpu: cli.pin_cpu.or(config.runner.pin_cpu),
            disabled,
            model_path: cli
                .model_path
                .clone()
                .unwrap_or_else(|| config.capabilities.model_path.clone()),
        })
    }

    /// Plan for these settings over the registered suites
    pub fn plan(&self) -> RunPlan {
        build_plan(perfpair_suites::all(), &self.suite, Some(&self.filter))
    }
}

/// Run the perfpair CLI with the process arguments.
/// This is the main entry point for the `perfpair` binary.
///
/// # Returns
/// Returns `Ok(())` on success, or the first error raised by a group.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the perfpair CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Logs go to stderr; stdout is the report channel.
    let filter = if cli.verbose {
        "perfpair=debug"
    } else {
        "perfpair=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = PerfConfig::discover()?.unwrap_or_default();
    let settings = Settings::resolve(&cli, &config)?;

    match cli.command {
        Some(Commands::List) => {
            print!("{}", format_plan(&settings.plan()));
            Ok(())
        }
        Some(Commands::Config) => {
            print!("{}", PerfConfig::default_toml());
            Ok(())
        }
        Some(Commands::Run) | None => run_suites(&settings),
    }
}

fn run_suites(settings: &Settings) -> anyhow::Result<()> {
    if let Some(cpu) = settings.pin_cpu {
        match pin_to_cpu(cpu) {
            Ok(()) => tracing::debug!(cpu, "pinned runner thread"),
            Err(e) => tracing::warn!(cpu, error = %e, "could not pin runner thread"),
        }
    }

    let reporter: Box<dyn Reporter> = match settings.format {
        OutputFormat::Human => Box::new(ConsoleReporter::stdout()),
        OutputFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let summary = execute(settings, reporter.as_ref())?;
    if summary.groups_run + summary.groups_skipped == 0 {
        eprintln!("No benchmark groups match.");
    }
    Ok(())
}

/// Probe capabilities and run the planned suites into `reporter`.
///
/// Capabilities are probed once, up front, even when nothing is planned.
pub fn execute(settings: &Settings, reporter: &dyn Reporter) -> anyhow::Result<RunSummary> {
    let probes = perfpair_suites::probes(&settings.model_path);
    let capabilities = Capabilities::probe(&probes, &settings.disabled, reporter);
    tracing::debug!(?capabilities, "capabilities probed");

    let plan = settings.plan();
    tracing::info!(
        suites = plan.suites.len(),
        groups = plan.group_count(),
        "starting run"
    );

    let summary = Runner::new(reporter, &capabilities).run_all(&plan.suites)?;
    reporter
        .check()
        .context("failed to write report output")?;
    tracing::info!(
        groups_run = summary.groups_run,
        groups_skipped = summary.groups_skipped,
        measurements = summary.measurements,
        "run finished"
    );
    Ok(summary)
}

/// Render a plan as the tree printed by `perfpair list`
pub fn format_plan(plan: &RunPlan) -> String {
    let mut out = String::from("perfpair plan:\n");
    for suite in &plan.suites {
        let _ = writeln!(out, "├── suite: {} ({})", suite.id, suite.title);
        for group in &suite.groups {
            let requires = if group.requires.is_empty() {
                String::new()
            } else {
                format!(" [requires {}]", group.requires.join(", "))
            };
            let _ = writeln!(out, "│   ├── {}: {}{}", group.id, group.title, requires);
        }
    }
    let _ = writeln!(out, "{} groups found.", plan.group_count());
    out
}
