// src/main.rs

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use stevedore::{
    Action, Catalog, DeclaredRecord, LiveSnapshot, ReconfigurationPlanner, StateReconciler,
    ValidationReport, Validator,
};

#[derive(Parser)]
#[command(name = "stevedore")]
#[command(author, version, about = "Profile dependency resolution and installation-state reconciliation", long_about = None)]
struct Cli {
    /// Path to the profile catalog
    #[arg(short, long, default_value = "catalog.toml")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a profile selection against the catalog
    Validate {
        /// Profile ids to select
        profiles: Vec<String>,
    },

    /// Reconcile declared state against a live service snapshot
    Status {
        /// Path to the declared state record (JSON)
        #[arg(short, long, default_value = "state.json")]
        state: PathBuf,

        /// Path to the live services list (JSON); omit if the runtime is
        /// unreachable
        #[arg(long)]
        services: Option<PathBuf>,
    },

    /// Plan an add, remove, or configure action
    Plan {
        /// Action to plan
        action: Action,

        /// Target profile ids
        profiles: Vec<String>,

        /// Path to the declared state record (JSON)
        #[arg(short, long, default_value = "state.json")]
        state: PathBuf,

        /// Path to the live services list (JSON)
        #[arg(long)]
        services: Option<PathBuf>,

        /// Proposed configuration values for `configure`, as key=value
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

fn load_snapshot(path: Option<&PathBuf>) -> Result<LiveSnapshot> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading services list {}", path.display()))?;
            LiveSnapshot::from_json_str(&text)
                .with_context(|| format!("parsing services list {}", path.display()))
        }
        None => Ok(LiveSnapshot::unavailable()),
    }
}

fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        println!("error: {error}");
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let catalog = Catalog::load(&cli.catalog)
        .with_context(|| format!("loading catalog {}", cli.catalog.display()))?;
    info!(profiles = catalog.len(), "catalog loaded");

    match cli.command {
        Commands::Validate { profiles } => {
            let report = Validator::new(&catalog).validate(&profiles);
            print_report(&report);
            if report.valid {
                println!(
                    "selection ok: {} profile(s), {} MB min memory, ports {:?}",
                    report.resolved.profiles.len(),
                    report.resolved.requirements.minimum.memory_mb,
                    report.resolved.ports
                );
            } else {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Status { state, services } => {
            let record = DeclaredRecord::load(&state);
            let snapshot = load_snapshot(services.as_ref())?;
            let pass = StateReconciler::new(&catalog).run_pass(&record, &snapshot);

            if !pass.snapshot_usable {
                println!("live status unavailable; showing declared state only");
            }
            for profile_state in pass.states.values() {
                let running = profile_state
                    .running_services
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{:<16} {:<14} {:<9} {}/{} services",
                    profile_state.profile_id,
                    profile_state.installation.to_string(),
                    profile_state.status.to_string(),
                    running,
                    profile_state.total_services
                );
            }
            Ok(())
        }

        Commands::Plan {
            action,
            profiles,
            state,
            services,
            set,
        } => {
            let record = DeclaredRecord::load(&state);
            let snapshot = load_snapshot(services.as_ref())?;
            let pass = StateReconciler::new(&catalog).run_pass(&record, &snapshot);

            // proposed configuration = current record with --set overlaid
            let proposed: Option<HashMap<String, String>> = if set.is_empty() {
                None
            } else {
                let mut merged = record.configuration.clone();
                for pair in &set {
                    let (key, value) = pair
                        .split_once('=')
                        .with_context(|| format!("invalid --set '{pair}', expected KEY=VALUE"))?;
                    merged.insert(key.to_string(), value.to_string());
                }
                Some(merged)
            };

            let planner = ReconfigurationPlanner::new(&catalog);
            match planner.plan(action, &profiles, proposed.as_ref(), &record, &pass) {
                Ok(impact) => {
                    for warning in &impact.warnings {
                        println!("warning: {warning}");
                    }
                    println!(
                        "{} -> restart: {}, est. downtime: {}s, affected: {:?}",
                        impact.action,
                        impact.restart_type,
                        impact.estimated_downtime_secs,
                        impact.affected_services
                    );
                    Ok(())
                }
                Err(report) => {
                    print_report(&report);
                    std::process::exit(1);
                }
            }
        }
    }
}
