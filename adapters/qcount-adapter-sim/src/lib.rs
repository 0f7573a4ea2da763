//! qcount Local Statevector Simulator
//!
//! This crate provides a local quantum simulator behind the
//! [`qcount_hal::Backend`] trait. The circuit is evolved exactly once as a
//! full statevector; shots are then drawn from the resulting distribution.
//!
//! # Features
//!
//! - **Exact Simulation**: Full statevector representation, no noise
//! - **All Standard Gates**: Supports every gate in `qcount-ir`
//! - **Reproducible Sampling**: Optional RNG seed per backend
//! - **Qiskit Bit Order**: Classical bit 0 is the rightmost character
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 16 | ~1 MB | Fast |
//! | 20 | ~16 MB | Moderate |
//! | 25 | ~512 MB | Slow |
//!
//! # Example
//!
//! ```ignore
//! use qcount_adapter_sim::SimulatorBackend;
//! use qcount_hal::Backend;
//! use qcount_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new().with_seed(42);
//!
//!     let circuit = Circuit::bell()?;
//!     let job_id = backend.submit(&circuit, 1000, None).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     // Roughly half '00', half '11'
//!     println!("{}", result.counts);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::{DEFAULT_MAX_QUBITS, MAX_STATEVECTOR_QUBITS, SimulatorBackend};
pub use statevector::Statevector;
