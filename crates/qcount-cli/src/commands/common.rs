//! Shared helpers for CLI commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use console::style;

use qcount_adapter_sim::SimulatorBackend;
use qcount_hal::{Backend, BackendRegistry, ExecutionResult};

use super::config::{RunConfig, SIMULATOR};

/// Flags that describe the experiment circuit.
#[derive(Debug, Default, Args)]
pub struct ExperimentArgs {
    /// Number of qubits (and classical bits) [default: 16]
    #[arg(short, long)]
    pub qubits: Option<u32>,

    /// Rotation angle applied to every qubit, in radians [default: 0]
    #[arg(short, long, allow_negative_numbers = true)]
    pub angle: Option<f64>,

    /// Number of shots [default: 1000]
    #[arg(short, long, env = "QCOUNT_SHOTS")]
    pub shots: Option<u32>,

    /// YAML or JSON file with run settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ExperimentArgs {
    /// Merge the config file (if any) with explicit flags.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(qubits) = self.qubits {
            config.qubits = qubits;
        }
        if let Some(angle) = self.angle {
            config.angle = angle;
        }
        if let Some(shots) = self.shots {
            config.shots = shots;
        }
        Ok(config)
    }
}

/// How `run` prints its result.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Qiskit counts dictionary on one line
    #[default]
    Dict,
    /// Histogram table with percentages
    Table,
    /// Full execution result as JSON
    Json,
}

/// Registry of every backend the CLI can run on.
pub fn backend_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register::<SimulatorBackend>(SIMULATOR);
    registry
}

/// Create the simulator configured by `config`.
pub fn create_backend(config: &RunConfig) -> Result<Box<dyn Backend>> {
    Ok(backend_registry().create(SIMULATOR, config.backend_config())?)
}

/// Print execution results in a table format.
pub fn print_results(result: &ExecutionResult) {
    println!(
        "\n{} Results ({} shots):",
        style("✓").green().bold(),
        result.shots
    );

    let sorted = result.counts.sorted();
    let total = result.counts.total_shots() as f64;

    for (bitstring, count) in sorted.iter().take(16) {
        let prob = **count as f64 / total * 100.0;
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  {}: {:>6} ({:>6.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }

    if let Some(time_ms) = result.execution_time_ms {
        println!("\n  Execution time: {} ms", style(time_ms).yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let args = ExperimentArgs::default();
        assert_eq!(args.resolve().unwrap(), RunConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, "qubits: 4\nshots: 10\n").unwrap();

        let args = ExperimentArgs {
            qubits: Some(6),
            config: Some(path),
            ..ExperimentArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.qubits, 6);
        assert_eq!(config.shots, 10);
    }

    #[test]
    fn test_registry_has_simulator() {
        let registry = backend_registry();
        assert_eq!(registry.available_backends(), vec![SIMULATOR]);
    }

    #[test]
    fn test_create_backend_applies_config() {
        let config = RunConfig {
            max_qubits: 6,
            ..RunConfig::default()
        };
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.name(), SIMULATOR);
        assert_eq!(backend.capabilities().num_qubits, 6);
    }
}
