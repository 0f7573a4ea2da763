//! End-to-end tests of the `qcount` binary.
//!
//! Each test spawns the built executable and checks its stdout, stderr and
//! exit status. `QCOUNT_*` variables are cleared so the host environment
//! cannot change defaults.

use std::process::{Command, Output};

use anyhow::Result;

fn qcount(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_qcount"))
        .args(args)
        .env_remove("QCOUNT_SHOTS")
        .env_remove("QCOUNT_SEED")
        .env_remove("RUST_LOG")
        .output()?)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_default_invocation_prints_reference_counts() -> Result<()> {
    let output = qcount(&[])?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "{'0000000000000000': 1000}\n");
    Ok(())
}

#[test]
fn test_run_subcommand_matches_default() -> Result<()> {
    let output = qcount(&["run"])?;
    assert!(output.status.success());
    assert_eq!(stdout(&output), "{'0000000000000000': 1000}\n");
    Ok(())
}

#[test]
fn test_run_pi_rotation_flips_every_qubit() -> Result<()> {
    let output = qcount(&["run", "-q", "3", "--angle", "3.141592653589793", "-s", "50"])?;
    assert!(output.status.success());
    assert_eq!(stdout(&output), "{'111': 50}\n");
    Ok(())
}

#[test]
fn test_run_seeded_is_reproducible() -> Result<()> {
    let args = ["run", "-q", "4", "--angle", "1.2", "--seed", "17"];
    let first = qcount(&args)?;
    let second = qcount(&args)?;
    assert!(first.status.success());
    assert_eq!(stdout(&first), stdout(&second));
    Ok(())
}

#[test]
fn test_run_json_output() -> Result<()> {
    let output = qcount(&["run", "-q", "2", "-s", "10", "--format", "json"])?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output))?;
    assert_eq!(value["shots"], 10);
    assert_eq!(value["counts"]["00"], 10);
    Ok(())
}

#[test]
fn test_run_table_output() -> Result<()> {
    let output = qcount(&["run", "-q", "2", "--format", "table"])?;
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Results (1000 shots)"));
    assert!(out.contains("00"));
    Ok(())
}

#[test]
fn test_run_too_many_qubits_fails() -> Result<()> {
    let output = qcount(&["run", "-q", "25"])?;
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("Error:"));
    Ok(())
}

#[test]
fn test_run_zero_shots_fails() -> Result<()> {
    let output = qcount(&["run", "-s", "0"])?;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error:"));
    Ok(())
}

#[test]
fn test_run_shots_from_environment() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_qcount"))
        .args(["run", "-q", "1"])
        .env("QCOUNT_SHOTS", "7")
        .env_remove("QCOUNT_SEED")
        .output()?;
    assert!(output.status.success());
    assert_eq!(stdout(&output), "{'0': 7}\n");
    Ok(())
}

#[test]
fn test_run_with_yaml_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("run.yaml");
    std::fs::write(&path, "qubits: 5\nshots: 42\n")?;

    let output = qcount(&["run", "--config", path.to_str().unwrap_or_default()])?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "{'00000': 42}\n");
    Ok(())
}

#[test]
fn test_run_with_invalid_config_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("run.yaml");
    std::fs::write(&path, "qubit_count: 5\n")?;

    let output = qcount(&["run", "--config", path.to_str().unwrap_or_default()])?;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid YAML config"));
    Ok(())
}

// ============================================================================
// emit
// ============================================================================

#[test]
fn test_emit_simulator_script() -> Result<()> {
    let output = qcount(&["emit"])?;
    assert!(output.status.success());
    let script = stdout(&output);
    assert!(script.starts_with("from qiskit import(\n"));
    assert!(script.contains("qc = QuantumCircuit(16,16)"));
    assert!(script.contains("job = execute(qc, simulator, shots=1000)"));
    Ok(())
}

#[test]
fn test_emit_ibmq_script() -> Result<()> {
    let output = qcount(&["emit", "--ibmq"])?;
    assert!(output.status.success());
    let script = stdout(&output);
    assert!(script.contains("IBMQ.load_account()"));
    assert!(script.contains("provider.get_backend('ibmq_16_melbourne')"));
    Ok(())
}

#[test]
fn test_emit_to_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("qc.py");

    let output = qcount(&["emit", "-q", "2", "-o", path.to_str().unwrap_or_default()])?;
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(std::fs::read_to_string(&path)?.contains("qc = QuantumCircuit(2,2)"));
    Ok(())
}

// ============================================================================
// probs
// ============================================================================

#[test]
fn test_probs_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("counts.txt");
    std::fs::write(&path, "{'10': 300, '00': 100}\n")?;

    let output = qcount(&["probs", "--bits", "2", "-i", path.to_str().unwrap_or_default()])?;
    assert!(output.status.success());
    assert_eq!(stdout(&output), "0 0.25\n2 0.75\n");
    Ok(())
}

#[test]
fn test_probs_rejects_malformed_counts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("counts.txt");
    std::fs::write(&path, "{'12': 3}")?;

    let output = qcount(&["probs", "--bits", "2", "-i", path.to_str().unwrap_or_default()])?;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error:"));
    Ok(())
}

// ============================================================================
// misc
// ============================================================================

#[test]
fn test_version() -> Result<()> {
    let output = qcount(&["version"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn test_unknown_subcommand_fails() -> Result<()> {
    let output = qcount(&["frobnicate"])?;
    assert!(!output.status.success());
    Ok(())
}
