use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use rdk_artifacts::{finalize_run_manifest, init_run_artifacts, InitRunArtifactsArgs, RunSettings};
use rdk_backtest::{run_tasks, ResultAggregator};

/// Execute `rdk run`: load + validate the plan, open the run's artifacts, run
/// the pool, and print a `key=value` report.
///
/// Per-task failures never fail the command; they show up in the counts.
pub fn run_plan(
    config_paths: &[PathBuf],
    concurrency: Option<usize>,
    out: Option<PathBuf>,
) -> Result<()> {
    let (loaded, mut plan) = super::load_plan(config_paths)?;
    if let Some(n) = concurrency {
        plan.concurrency = n;
    }
    if let Some(p) = out {
        plan.output.results_csv = Some(p);
    }
    plan.validate()?;

    let cfg = plan.backtest_config();
    let engine = plan.engine_command();
    let tasks = plan.tasks();
    let run_id = Uuid::new_v4();

    let artifacts = init_run_artifacts(InitRunArtifactsArgs {
        exports_root: &plan.output.exports_root,
        run_id,
        config_hash: &loaded.config_hash,
        engine: &engine.display(),
        settings: RunSettings {
            initial_cash: cfg.initial_cash,
            concurrency: cfg.concurrency,
            precision: cfg.precision,
        },
        task_count: tasks.len(),
        results_csv: plan.output.results_csv.as_deref(),
    })?;

    if let Some(parent) = artifacts.results_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create results dir failed: {}", parent.display()))?;
        }
    }
    let sink = File::create(&artifacts.results_path).with_context(|| {
        format!(
            "open results csv failed: {}",
            artifacts.results_path.display()
        )
    })?;
    let results = ResultAggregator::new(sink, cfg.precision).context("write results header failed")?;

    info!(
        %run_id,
        config_hash = %loaded.config_hash,
        tasks = tasks.len(),
        concurrency = cfg.concurrency,
        engine = %engine.display(),
        "run starting"
    );

    let report = run_tasks(&cfg, &tasks, &engine, &results).context("worker pool failed")?;
    results.finish().context("flush results csv failed")?;
    finalize_run_manifest(&artifacts.manifest_path, &report)?;

    println!("run_ok=true");
    println!("run_id={run_id}");
    println!("config_hash={}", loaded.config_hash);
    println!("tasks={}", tasks.len());
    println!("completed={}", report.completed);
    println!("empty={}", report.empty);
    println!("abandoned={}", report.abandoned);
    println!("results={}", artifacts.results_path.display());
    println!("manifest={}", artifacts.manifest_path.display());

    Ok(())
}
