//! Emit command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use qcount_ir::QiskitScript;
use qcount_ir::qiskit::DEFAULT_IBMQ_BACKEND;

use super::common::ExperimentArgs;
use super::config::RunConfig;

/// Arguments of `qcount emit`.
#[derive(Debug, Default, Args)]
pub struct EmitArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Target an IBM Quantum device instead of the Aer simulator
    #[arg(
        long,
        value_name = "BACKEND",
        num_args = 0..=1,
        default_missing_value = DEFAULT_IBMQ_BACKEND
    )]
    pub ibmq: Option<String>,

    /// Write the script to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Render the Qiskit script for `config`.
pub fn render(config: &RunConfig, ibmq: Option<&str>) -> Result<String> {
    let script = match ibmq {
        Some(backend) => QiskitScript::for_ibmq(config.shots, backend),
        None => QiskitScript::for_simulator(config.shots),
    };
    Ok(script.render(&config.circuit()?)?)
}

/// Execute the emit command.
pub fn execute(args: &EmitArgs) -> Result<()> {
    let config = args.experiment.resolve()?;
    config.validate()?;
    let script = render(&config, args.ibmq.as_deref())?;

    match &args.output {
        Some(path) => write_script(path, &script),
        None => {
            print!("{script}");
            Ok(())
        }
    }
}

fn write_script(path: &Path, script: &str) -> Result<()> {
    fs::write(path, script)
        .with_context(|| format!("Failed to write script: {}", path.display()))?;
    eprintln!(
        "{} Wrote {}",
        style("✓").green().bold(),
        style(path.display()).cyan()
    );
    Ok(())
}
