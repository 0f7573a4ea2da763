//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - rotation-layer sampling on a local quantum simulator",
        style("qcount").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qcount-ir           Circuit model and Qiskit script rendering");
    println!("  qcount-hal          Backend trait, jobs and measurement counts");
    println!("  qcount-adapter-sim  Statevector simulator backend");
    println!("  qcount-cli          Command-line interface");
    println!();
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
