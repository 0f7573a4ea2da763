//! qcount Command-Line Interface
//!
//! Runs an `rx` rotation layer on the local statevector simulator and prints
//! the measurement histogram in Qiskit's dictionary notation.
//!
//! ```text
//! $ qcount
//! {'0000000000000000': 1000}
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::emit::EmitArgs;
use commands::run::RunArgs;
use commands::{emit, probs, run, version};

/// qcount - sample a rotation-layer circuit on a local quantum simulator
#[derive(Parser)]
#[command(name = "qcount")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Without a subcommand, runs the 16-qubit experiment with 1000 shots
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the experiment on the simulator and print the counts
    Run(RunArgs),

    /// Print the equivalent Qiskit script
    Emit(EmitArgs),

    /// Turn a Qiskit counts dictionary into a probability vector
    Probs {
        /// File holding the counts dictionary (stdin if omitted)
        #[arg(short, long)]
        input: Option<std::path::PathBuf>,

        /// Width of the classical register
        #[arg(short, long)]
        bits: u32,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for results.
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        None => run::execute(&RunArgs::default()).await,
        Some(Commands::Run(args)) => run::execute(&args).await,
        Some(Commands::Emit(args)) => emit::execute(&args),
        Some(Commands::Probs { input, bits }) => probs::execute(input.as_deref(), bits),
        Some(Commands::Version) => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::common::OutputFormat;

    #[test]
    fn test_parse_no_subcommand() {
        let cli = Cli::try_parse_from(["qcount"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_run_minimal() {
        let cli = Cli::try_parse_from(["qcount", "run"]).unwrap();
        match cli.command {
            Some(Commands::Run(args)) => {
                assert!(args.experiment.qubits.is_none());
                assert!(args.experiment.angle.is_none());
                assert!(args.max_qubits.is_none());
                assert_eq!(args.format, OutputFormat::Dict);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_run_with_all_args() {
        let cli = Cli::try_parse_from([
            "qcount",
            "run",
            "-q",
            "4",
            "--angle",
            "-1.5",
            "--shots",
            "200",
            "--seed",
            "9",
            "--max-qubits",
            "8",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.experiment.qubits, Some(4));
                assert_eq!(args.experiment.angle, Some(-1.5));
                assert_eq!(args.experiment.shots, Some(200));
                assert_eq!(args.seed, Some(9));
                assert_eq!(args.max_qubits, Some(8));
                assert_eq!(args.format, OutputFormat::Json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_run_rejects_bad_format() {
        assert!(Cli::try_parse_from(["qcount", "run", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_parse_emit_ibmq_default_backend() {
        let cli = Cli::try_parse_from(["qcount", "emit", "--ibmq"]).unwrap();
        match cli.command {
            Some(Commands::Emit(args)) => {
                assert_eq!(args.ibmq.as_deref(), Some("ibmq_16_melbourne"));
                assert!(args.output.is_none());
            }
            _ => panic!("Expected Emit command"),
        }

        let cli = Cli::try_parse_from(["qcount", "emit", "--ibmq", "ibmq_lima"]).unwrap();
        match cli.command {
            Some(Commands::Emit(args)) => assert_eq!(args.ibmq.as_deref(), Some("ibmq_lima")),
            _ => panic!("Expected Emit command"),
        }
    }

    #[test]
    fn test_parse_probs_requires_bits() {
        assert!(Cli::try_parse_from(["qcount", "probs"]).is_err());
        let cli = Cli::try_parse_from(["qcount", "probs", "--bits", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Probs { input: None, bits: 3 })
        ));
    }

    #[test]
    fn test_parse_verbose_flag() {
        let cli = Cli::try_parse_from(["qcount", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Version)));
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["qcount", "foobar"]).is_err());
    }
}
