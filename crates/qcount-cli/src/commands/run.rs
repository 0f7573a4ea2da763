//! Run command implementation.

use anyhow::Result;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::common::{ExperimentArgs, OutputFormat, create_backend, print_results};
use super::config::RunConfig;

/// Arguments of `qcount run`.
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Seed the sampler for reproducible counts
    #[arg(long, env = "QCOUNT_SEED")]
    pub seed: Option<u64>,

    /// Largest circuit the simulator accepts [default: 20]
    #[arg(long)]
    pub max_qubits: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Final run settings after applying the config file and every flag.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = self.experiment.resolve()?;
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(max_qubits) = self.max_qubits {
            config.max_qubits = max_qubits;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = args.resolve()?;
    let circuit = config.circuit()?;
    let backend = create_backend(&config)?;

    info!(
        qubits = config.qubits,
        angle = config.angle,
        shots = config.shots,
        "running experiment"
    );

    let avail = backend.availability().await?;
    if !avail.is_available {
        anyhow::bail!(
            "Backend '{}' is not available{}",
            backend.name(),
            avail
                .status_message
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        );
    }

    let validation = backend.validate(&circuit).await?;
    if let qcount_hal::ValidationResult::Invalid { reasons } = validation {
        anyhow::bail!("Circuit rejected by {}: {}", backend.name(), reasons.join("; "));
    }

    // Only the table view is interactive.
    let spinner = if args.format == OutputFormat::Table {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        spinner.set_message("Submitting job...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(spinner)
    } else {
        None
    };

    let job_id = backend.submit(&circuit, config.shots, None).await?;
    if let Some(spinner) = &spinner {
        spinner.set_message(format!("Running job {job_id}..."));
    }

    let result = backend.wait(&job_id).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let result = result?;

    match args.format {
        OutputFormat::Dict => println!("{}", result.counts),
        OutputFormat::Table => {
            println!(
                "{} {} qubits, rx({}), {} shots on {}",
                style("→").cyan().bold(),
                config.qubits,
                config.angle,
                config.shots,
                style(backend.name()).yellow()
            );
            print_results(&result);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}
