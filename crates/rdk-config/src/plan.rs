use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use rdk_backtest::{BacktestConfig, Task};
use rdk_engine::EngineCommand;

use crate::LoadedConfig;

/// Typed view of a merged run configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunPlan {
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Decimal places of the numeric result columns.
    #[serde(default = "default_precision")]
    pub precision: usize,
    pub engine: EngineSpec,
    #[serde(default)]
    pub output: OutputSpec,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSpec {
    /// Results CSV. Defaults to `results.csv` inside the run's export dir.
    #[serde(default)]
    pub results_csv: Option<PathBuf>,
    #[serde(default = "default_exports_root")]
    pub exports_root: PathBuf,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            results_csv: None,
            exports_root: default_exports_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpec {
    pub id: String,
    pub files: Vec<PathBuf>,
}

fn default_initial_cash() -> f64 {
    BacktestConfig::default().initial_cash
}

fn default_concurrency() -> usize {
    BacktestConfig::default().concurrency
}

fn default_precision() -> usize {
    BacktestConfig::default().precision
}

fn default_exports_root() -> PathBuf {
    PathBuf::from("exports")
}

/// f64 formatting stops being meaningful past this many decimals.
const MAX_PRECISION: usize = 17;

impl RunPlan {
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        serde_json::from_value(loaded.config_json.clone())
            .context("CONFIG_INVALID: run plan does not match the expected shape")
    }

    /// Reject plans the pool could not run sensibly.
    pub fn validate(&self) -> Result<()> {
        if self.engine.program.trim().is_empty() {
            bail!("CONFIG_INVALID: engine.program must not be empty");
        }
        if self.concurrency == 0 {
            bail!("CONFIG_INVALID: concurrency must be >= 1");
        }
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            bail!(
                "CONFIG_INVALID: initial_cash must be a positive number (got {})",
                self.initial_cash
            );
        }
        if self.precision > MAX_PRECISION {
            bail!(
                "CONFIG_INVALID: precision must be <= {} (got {})",
                MAX_PRECISION,
                self.precision
            );
        }

        let mut seen = HashSet::new();
        for t in &self.tasks {
            if t.id.trim().is_empty() {
                bail!("CONFIG_INVALID: task id must not be empty");
            }
            if !seen.insert(t.id.as_str()) {
                bail!("CONFIG_INVALID: duplicate task id {:?}", t.id);
            }
            if t.files.is_empty() {
                bail!("CONFIG_INVALID: task {:?} lists no files", t.id);
            }
        }
        Ok(())
    }

    /// Anchor every relative path in the plan at `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for t in &mut self.tasks {
            t.files.iter_mut().for_each(anchor);
        }
        if let Some(dir) = self.engine.working_dir.as_mut() {
            anchor(dir);
        }
        if let Some(out) = self.output.results_csv.as_mut() {
            anchor(out);
        }
        anchor(&mut self.output.exports_root);
        self
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_cash: self.initial_cash,
            concurrency: self.concurrency,
            precision: self.precision,
        }
    }

    pub fn engine_command(&self) -> EngineCommand {
        let mut cmd = EngineCommand::new(self.engine.program.clone());
        for a in &self.engine.args {
            cmd = cmd.arg(a.clone());
        }
        if let Some(dir) = &self.engine.working_dir {
            cmd = cmd.working_dir(dir.clone());
        }
        cmd
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks
            .iter()
            .map(|t| Task::new(t.id.clone(), t.files.iter().cloned()))
            .collect()
    }

    /// `(task id, path)` for every listed input file that is not a readable file.
    pub fn missing_files(&self) -> Vec<(&str, &Path)> {
        self.tasks
            .iter()
            .flat_map(|t| t.files.iter().map(move |f| (t.id.as_str(), f.as_path())))
            .filter(|(_, f)| !f.is_file())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_layered_yaml_from_strings;

    fn plan(yaml: &str) -> RunPlan {
        RunPlan::from_loaded(&load_layered_yaml_from_strings(&[yaml]).unwrap()).unwrap()
    }

    #[test]
    fn defaults_fill_in_omitted_fields() {
        let p = plan("engine:\n  program: ./bot\n");
        assert_eq!(p.initial_cash, 1_000_000.0);
        assert_eq!(p.concurrency, 4);
        assert_eq!(p.precision, 6);
        assert!(p.tasks.is_empty());
        assert_eq!(p.output, OutputSpec::default());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn relative_paths_are_anchored() {
        let p = plan(
            "engine: {program: bot, working_dir: w}\n\
             output: {results_csv: /abs/out.csv}\n\
             tasks: [{id: a, files: [x.csv, /data/y.csv]}]\n",
        )
        .relative_to(Path::new("/cfg"));
        assert_eq!(
            p.tasks[0].files,
            vec![PathBuf::from("/cfg/x.csv"), PathBuf::from("/data/y.csv")]
        );
        assert_eq!(p.engine.working_dir, Some(PathBuf::from("/cfg/w")));
        assert_eq!(p.output.results_csv, Some(PathBuf::from("/abs/out.csv")));
        assert_eq!(p.output.exports_root, PathBuf::from("/cfg/exports"));
        // Program is resolved by the OS, not anchored.
        assert_eq!(p.engine.program, "bot");
    }

    #[test]
    fn engine_command_carries_args_in_order() {
        let p = plan("engine: {program: python3, args: [bot.py, --fast]}\n");
        let cmd = p.engine_command();
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["bot.py", "--fast"]);
        assert_eq!(cmd.working_dir, None);
    }
}
