//! Run configuration.
//!
//! Settings come from three layers, later ones winning:
//! built-in defaults, an optional YAML or JSON file, then command-line flags
//! (and their `QCOUNT_*` environment variables).
//!
//! ```yaml
//! qubits: 16
//! angle: 0.0
//! shots: 1000
//! seed: 42
//! max_qubits: 20
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use qcount_adapter_sim::{DEFAULT_MAX_QUBITS, MAX_STATEVECTOR_QUBITS};
use qcount_hal::BackendConfig;
use qcount_ir::Circuit;

/// Name the simulator is registered under.
pub const SIMULATOR: &str = "simulator";

/// Parameters of one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Number of qubits, and of classical bits.
    pub qubits: u32,
    /// Angle of the `rx` rotation applied to every qubit, in radians.
    pub angle: f64,
    /// Number of shots.
    pub shots: u32,
    /// RNG seed for reproducible sampling.
    pub seed: Option<u64>,
    /// Largest circuit the simulator accepts.
    pub max_qubits: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            qubits: 16,
            angle: 0.0,
            shots: 1000,
            seed: None,
            max_qubits: DEFAULT_MAX_QUBITS,
        }
    }
}

impl RunConfig {
    /// Load a configuration file; `.json` is read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config = if is_json {
            serde_json::from_str(&source)
                .with_context(|| format!("Invalid JSON config: {}", path.display()))?
        } else {
            serde_yaml_ng::from_str(&source)
                .with_context(|| format!("Invalid YAML config: {}", path.display()))?
        };
        Ok(config)
    }

    /// Reject settings no run could satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.qubits == 0 {
            anyhow::bail!("qubits must be at least 1");
        }
        if !self.angle.is_finite() {
            anyhow::bail!("angle must be a finite number, got {}", self.angle);
        }
        if self.max_qubits > MAX_STATEVECTOR_QUBITS {
            anyhow::bail!(
                "max_qubits = {} exceeds the statevector limit of {}",
                self.max_qubits,
                MAX_STATEVECTOR_QUBITS
            );
        }
        Ok(())
    }

    /// The experiment circuit: `rx(angle)` on every qubit, then measure all.
    pub fn circuit(&self) -> Result<Circuit> {
        Circuit::rx_layer(self.qubits, self.angle).context("Failed to build circuit")
    }

    /// Backend configuration for the simulator.
    pub fn backend_config(&self) -> BackendConfig {
        let config = BackendConfig::new(SIMULATOR)
            .with_extra("max_qubits", serde_json::json!(self.max_qubits));
        match self.seed {
            Some(seed) => config.with_extra("seed", serde_json::json!(seed)),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.qubits, 16);
        assert_eq!(config.angle, 0.0);
        assert_eq!(config.shots, 1000);
        assert!(config.seed.is_none());
        assert_eq!(config.max_qubits, 20);
        assert!(config.validate().is_ok());
        assert_eq!(config.circuit().unwrap().num_ops(), 17);
    }

    #[test]
    fn test_load_yaml_partial() {
        let file = write_temp(".yaml", "qubits: 4\nseed: 11\n");
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.qubits, 4);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.shots, 1000);
    }

    #[test]
    fn test_load_json() {
        let file = write_temp(".json", r#"{"shots": 250, "angle": 1.5}"#);
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.shots, 250);
        assert_eq!(config.angle, 1.5);
        assert_eq!(config.qubits, 16);
    }

    #[test]
    fn test_load_rejects_unknown_field() {
        let file = write_temp(".yaml", "qbits: 4\n");
        let err = RunConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("qbits"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RunConfig::load(Path::new("/nonexistent/qcount.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_validate() {
        let config = RunConfig {
            qubits: 0,
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RunConfig {
            max_qubits: 31,
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RunConfig {
            angle: f64::NAN,
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_config() {
        let config = RunConfig {
            seed: Some(5),
            max_qubits: 12,
            ..RunConfig::default()
        };
        let backend = config.backend_config();
        assert_eq!(backend.name, SIMULATOR);
        assert_eq!(backend.get_u64("seed").unwrap(), Some(5));
        assert_eq!(backend.get_u64("max_qubits").unwrap(), Some(12));

        assert_eq!(RunConfig::default().backend_config().get_u64("seed").unwrap(), None);
    }
}
