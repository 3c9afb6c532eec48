//! Per-run export directory: `<exports_root>/<run_id>/manifest.json`.
//!
//! The manifest is written before any task starts and rewritten once the pool
//! finishes, so an interrupted run is visible as a manifest without an outcome.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use rdk_backtest::PoolReport;

pub const MANIFEST_SCHEMA_VERSION: i32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";
pub const DEFAULT_RESULTS_FILE: &str = "results.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub config_hash: String,
    /// Engine command line as launched per task.
    pub engine: String,
    pub created_at_utc: DateTime<Utc>,
    #[serde(default)]
    pub finished_at_utc: Option<DateTime<Utc>>,
    pub settings: RunSettings,
    pub task_count: usize,
    pub results_csv: String,
    #[serde(default)]
    pub outcome: Option<RunOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub initial_cash: f64,
    pub concurrency: usize,
    pub precision: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub completed: usize,
    pub empty: usize,
    pub abandoned: usize,
    pub batches: usize,
    pub peak_concurrency: usize,
}

impl From<&PoolReport> for RunOutcome {
    fn from(r: &PoolReport) -> Self {
        Self {
            completed: r.completed,
            empty: r.empty,
            abandoned: r.abandoned,
            batches: r.batches,
            peak_concurrency: r.peak_concurrency,
        }
    }
}

pub struct InitRunArtifactsArgs<'a> {
    pub exports_root: &'a Path,
    pub run_id: Uuid,
    pub config_hash: &'a str,
    pub engine: &'a str,
    pub settings: RunSettings,
    pub task_count: usize,
    /// Explicit results location; `None` puts `results.csv` in the run dir.
    pub results_csv: Option<&'a Path>,
}

#[derive(Debug, Clone)]
pub struct InitRunArtifactsResult {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub results_path: PathBuf,
}

pub fn init_run_artifacts(args: InitRunArtifactsArgs<'_>) -> Result<InitRunArtifactsResult> {
    let run_dir = args.exports_root.join(args.run_id.to_string());
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create exports dir failed: {}", run_dir.display()))?;

    let results_path = match args.results_csv {
        Some(p) => p.to_path_buf(),
        None => run_dir.join(DEFAULT_RESULTS_FILE),
    };

    let manifest = RunManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        run_id: args.run_id,
        config_hash: args.config_hash.to_string(),
        engine: args.engine.to_string(),
        created_at_utc: Utc::now(),
        finished_at_utc: None,
        settings: args.settings,
        task_count: args.task_count,
        results_csv: results_path.display().to_string(),
        outcome: None,
    };

    let manifest_path = run_dir.join(MANIFEST_FILE);
    write_manifest(&manifest_path, &manifest)?;

    Ok(InitRunArtifactsResult {
        run_dir,
        manifest_path,
        results_path,
    })
}

/// Stamp the pool outcome and finish time onto an existing manifest.
pub fn finalize_run_manifest(manifest_path: &Path, report: &PoolReport) -> Result<RunManifest> {
    let mut manifest = read_manifest(manifest_path)?;
    manifest.outcome = Some(RunOutcome::from(report));
    manifest.finished_at_utc = Some(Utc::now());
    write_manifest(manifest_path, &manifest)?;
    Ok(manifest)
}

pub fn read_manifest(path: &Path) -> Result<RunManifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read manifest failed: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse manifest failed: {}", path.display()))
}

fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest).context("serialize manifest failed")?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write manifest failed: {}", path.display()))
}
