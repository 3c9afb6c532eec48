use anyhow::{bail, Result};
use std::path::PathBuf;

/// Execute `rdk check`. Fails when the plan is invalid or any input is missing.
pub fn check_plan(config_paths: &[PathBuf]) -> Result<()> {
    let (loaded, plan) = super::load_plan(config_paths)?;
    plan.validate()?;

    println!("config_hash={}", loaded.config_hash);
    println!("engine={}", plan.engine_command().display());
    println!("tasks={}", plan.tasks.len());

    let missing = plan.missing_files();
    for (task, path) in &missing {
        println!("missing task={} path={}", task, path.display());
    }
    println!("missing_files={}", missing.len());

    if !missing.is_empty() {
        bail!("CHECK_FAILED: {} input file(s) not found", missing.len());
    }
    println!("check_ok=true");
    Ok(())
}
