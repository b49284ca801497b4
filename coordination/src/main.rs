//! Fix Coordination CLI
//!
//! Drives the escalation ladder and blocking registry offline against a file
//! of detected errors. Useful for checking how a config change moves errors
//! through the ladder before rolling it out.
//!
//! ```bash
//! # Where would each error start?
//! fix-coordination triage --errors errors.json
//!
//! # Walk every error up the ladder, resolving on the 4th attempt
//! fix-coordination simulate --errors errors.json --config escalation.toml --resolve-at 4
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fix_coordination::blocking::{BlockReason, TaskBlockingRegistry};
use fix_coordination::escalation::{
    get_escalation_report, initial_level, should_immediately_escalate, AttemptOutcome,
    DetectedError, EscalationConfig, EscalationEngine, EscalationState, EscalationStatus,
};
use std::path::{Path, PathBuf};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the starting rung for each error
    Triage {
        /// JSON array of detected errors
        #[arg(long)]
        errors: PathBuf,

        /// TOML escalation config (defaults to ESCALATION_* env vars)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Walk each error up the ladder with simulated fix outcomes
    Simulate {
        /// JSON array of detected errors
        #[arg(long)]
        errors: PathBuf,

        /// TOML escalation config (defaults to ESCALATION_* env vars)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Task ID prefix; each error gets `{task}-{n}`
        #[arg(long, default_value = "task")]
        task: String,

        /// Attempt number that succeeds (every attempt fails if unset)
        #[arg(long)]
        resolve_at: Option<u32>,

        /// Print final states as JSON instead of the text report
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fix_coordination=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Triage { errors, config } => {
            let config = load_config(config.as_deref())?;
            let errors = load_errors(&errors)?;
            triage(&errors, config);
        }
        Command::Simulate {
            errors,
            config,
            task,
            resolve_at,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let errors = load_errors(&errors)?;
            let (states, registry) = simulate(&errors, config, &task, resolve_at)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&states)?);
            } else {
                println!("{}", get_escalation_report(&states));
                println!("Blocking: {}", registry.get_summary());
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EscalationConfig> {
    let config = match path {
        Some(path) => EscalationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EscalationConfig::from_env(),
    };
    config.validate()?;
    tracing::info!(
        "Escalation config: max_retries={}, max_total_attempts={}, auto_escalate_critical={}",
        config.max_retries,
        config.max_total_attempts,
        config.auto_escalate_critical
    );
    Ok(config)
}

fn load_errors(path: &Path) -> Result<Vec<DetectedError>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read errors file {}", path.display()))?;
    let errors: Vec<DetectedError> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid errors JSON in {}", path.display()))?;
    Ok(errors)
}

fn triage(errors: &[DetectedError], config: EscalationConfig) {
    let engine = EscalationEngine::with_config(config);
    for error in errors {
        let level = initial_level(error, engine.config());
        let immediate = should_immediately_escalate(error, engine.config());
        println!(
            "{} [{}/{}/{}] start={}{}",
            error.id,
            error.category,
            error.severity,
            error.fixability,
            level,
            if immediate { " (immediate human)" } else { "" }
        );
    }
}

/// Run each error through the ladder, sequencing the registry the way a live
/// orchestrator would: block on dispatch, report the fix outcome, then record
/// the attempt.
fn simulate(
    errors: &[DetectedError],
    config: EscalationConfig,
    task_prefix: &str,
    resolve_at: Option<u32>,
) -> Result<(Vec<EscalationState>, TaskBlockingRegistry)> {
    let engine = EscalationEngine::with_config(config);
    let mut registry = TaskBlockingRegistry::new();
    let mut states = Vec::with_capacity(errors.len());

    for (i, error) in errors.iter().enumerate() {
        let task_id = format!("{}-{}", task_prefix, i + 1);
        let mut state = engine.create_escalation(error, &task_id);
        let mut previous_fix: Option<String> = None;

        while !state.is_terminal() {
            let n = state.total_attempts + 1;
            let fix_id = format!("{}-fix-{}", state.id, n);

            if let Some(prev) = previous_fix.take() {
                registry.unblock(&task_id, &prev);
            }
            let level = state.current_level.to_string();
            registry.block_for_fix(&task_id, &fix_id, Some(level.as_str()));

            let resolved = resolve_at == Some(n);
            let outcome = if resolved {
                registry.fix_task_completed(&fix_id);
                AttemptOutcome::resolved(format!("{} fix", level), "verification passed")
            } else {
                registry.fix_task_failed(&fix_id);
                previous_fix = Some(fix_id);
                AttemptOutcome::failed(format!("{} fix", level), "verification failed")
            };

            state = engine.record_attempt(&state, outcome.with_agent(level))?;
        }

        if state.status == EscalationStatus::HumanRequired {
            if let Some(prev) = previous_fix.take() {
                registry.unblock(&task_id, &prev);
            }
            let ticket = state.human_ticket.as_ref().map(|t| t.id.as_str());
            registry.block_task(&task_id, BlockReason::ManualHold, ticket);
        }

        states.push(state);
    }

    Ok((states, registry))
}
