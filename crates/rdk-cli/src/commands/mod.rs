//! Command handlers for `rdk`.

pub mod check;
pub mod run;

use anyhow::Result;
use rdk_config::{LoadedConfig, RunPlan};
use std::path::{Path, PathBuf};

/// Load the layered config and decode it into an anchored run plan.
///
/// Relative paths inside the plan are taken relative to the directory of the
/// first (base) config file.
pub fn load_plan(config_paths: &[PathBuf]) -> Result<(LoadedConfig, RunPlan)> {
    let loaded = rdk_config::load_layered_yaml(config_paths)?;
    let plan = RunPlan::from_loaded(&loaded)?.relative_to(&plan_base_dir(config_paths));
    Ok((loaded, plan))
}

fn plan_base_dir(config_paths: &[PathBuf]) -> PathBuf {
    config_paths
        .first()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
