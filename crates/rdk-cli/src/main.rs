use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "rdk")]
#[command(about = "ReplayDesk: replay price history through external decision engines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every task of a plan and write the results CSV
    Run {
        /// Layered config paths in merge order (base -> overrides)
        #[arg(long = "config", required = true)]
        config_paths: Vec<PathBuf>,

        /// Override the plan's concurrency ceiling
        #[arg(long)]
        concurrency: Option<usize>,

        /// Override the results CSV path
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Validate a plan and report missing input files without running it
    Check {
        #[arg(long = "config", required = true)]
        config_paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Run {
            config_paths,
            concurrency,
            out,
        } => commands::run::run_plan(&config_paths, concurrency, out),

        Commands::ConfigHash { paths } => {
            let loaded = rdk_config::load_layered_yaml(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }

        Commands::Check { config_paths } => commands::check::check_plan(&config_paths),
    }
}

/// Logs go to stderr; stdout carries only the `key=value` report.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
