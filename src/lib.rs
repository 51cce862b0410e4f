// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod services;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_cli_settings;
use crate::config::Settings;
use crate::dag::fifa::build_pipeline;
use crate::dag::{PipelineDefinition, RunSummary, Scheduler};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::{PipelineError, Result};
use crate::exec::OperatorExecutorBackend;
use crate::fs::RealFileSystem;
use crate::services::Services;
use crate::types::RunRequestBehaviour;

/// Default directory backing the local object store.
pub const DEFAULT_SANDBOX_DIR: &str = ".qualitydag/objects";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading and pipeline construction
/// - local collaborators (object store under `--sandbox`, in-memory
///   warehouse, checkpoint engine)
/// - scheduler / queue / runtime / executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<Vec<RunSummary>> {
    let settings = load_cli_settings(args.config.as_deref())?;
    let definition = build_pipeline(&settings)?;

    if args.dry_run {
        print_dry_run(&settings, &definition)?;
        return Ok(Vec::new());
    }

    let sandbox = args
        .sandbox
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SANDBOX_DIR));
    let services = Arc::new(Services::local(
        &settings,
        &sandbox,
        Arc::new(RealFileSystem),
    ));

    let summaries = run_pipeline(&settings, &definition, services, args.runs).await?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }

    Ok(summaries)
}

/// Execute `runs` runs of `definition` against `services` and return their
/// summaries in completion order.
///
/// Every run request is enqueued before the runtime starts, so runs beyond
/// the first go through the run queue. Asking for more runs than the queue
/// can hold is a configuration error.
pub async fn run_pipeline(
    settings: &Settings,
    definition: &PipelineDefinition,
    services: Arc<Services>,
    runs: usize,
) -> Result<Vec<RunSummary>> {
    if runs == 0 {
        info!("no runs requested");
        return Ok(Vec::new());
    }

    let capacity = startup_run_capacity(settings);
    if runs > capacity {
        return Err(PipelineError::ConfigError(format!(
            "{runs} runs requested but run_request_behaviour = {:?} with max_queued_runs = {} allows at most {capacity}",
            settings.run_request_behaviour, settings.max_queued_runs
        )));
    }

    let scheduler = Scheduler::from_definition(definition);

    // Room for every startup request plus in-flight completions.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64.max(runs + 16));

    let executor = OperatorExecutorBackend::new(rt_tx.clone(), services);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(dag_id = %definition.dag_id(), runs, "requesting pipeline runs");
    for _ in 0..runs {
        rt_tx
            .send(RuntimeEvent::RunRequested {
                reason: TriggerReason::Startup,
            })
            .await
            .map_err(errors::Error::from)?;
    }

    let options = RuntimeOptions {
        exit_when_idle: true,
    };

    // Construct the pure core runtime (single source of truth for semantics).
    let core = CoreRuntime::new(
        scheduler,
        settings.run_request_behaviour,
        settings.max_queued_runs,
        options,
    );

    // Construct the async IO shell around the core.
    let runtime = Runtime::new(core, rt_rx, executor);
    runtime.run().await
}

/// Number of startup runs that execute: one active run plus whatever the
/// run queue keeps.
fn startup_run_capacity(settings: &Settings) -> usize {
    match settings.run_request_behaviour {
        RunRequestBehaviour::Queue => settings.max_queued_runs.max(1) + 1,
        RunRequestBehaviour::Skip => 1,
    }
}

/// Dry-run output: settings, then tasks in topological order with their
/// operator kind, trigger rule and upstream tasks.
fn print_dry_run(settings: &Settings, definition: &PipelineDefinition) -> Result<()> {
    println!("qualitydag dry-run");
    println!("  dag_id = {}", definition.dag_id());
    if let Some(description) = definition.description() {
        println!("  description = {description}");
    }
    println!(
        "  project_id = {}",
        settings.project_id.as_deref().unwrap_or("<unset>")
    );
    println!(
        "  bucket = {}",
        settings.bucket.as_deref().unwrap_or("<unset>")
    );
    println!("  dataset = {}", settings.dataset);
    println!("  data_file = {}", settings.data_file.display());
    println!("  context_root = {}", settings.context_root.display());
    println!(
        "  run_request_behaviour = {:?}",
        settings.run_request_behaviour
    );
    println!("  max_queued_runs = {}", settings.max_queued_runs);
    println!();

    let order = definition.topological_order()?;
    println!("tasks ({}):", order.len());
    for id in &order {
        let Some(node) = definition.task(id) else {
            continue;
        };
        println!("  - {id}");
        println!("      kind: {}", node.operator.kind());
        println!("      trigger_rule: {}", node.trigger_rule);
        let upstream = definition.predecessors_of(id);
        if !upstream.is_empty() {
            println!("      after: {upstream:?}");
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
