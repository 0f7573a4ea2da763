//! qcount Backend Abstraction Layer
//!
//! This crate provides the interface between a [`qcount_ir::Circuit`] and the
//! thing that executes it.
//!
//! # Overview
//!
//! - A common [`Backend`] trait for job submission and management
//! - [`Capabilities`] to describe what a backend accepts
//! - [`BackendRegistry`] to create backends by name from a [`BackendConfig`]
//! - Unified result handling via [`ExecutionResult`] and [`Counts`]
//!
//! # Example: Running a Circuit
//!
//! ```ignore
//! use qcount_hal::Backend;
//! use qcount_adapter_sim::SimulatorBackend;
//! use qcount_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let circuit = Circuit::rx_layer(16, 0.0)?;
//!     let backend = SimulatorBackend::new();
//!
//!     let job_id = backend.submit(&circuit, 1000, None).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     // {'0000000000000000': 1000}
//!     println!("{}", result.counts);
//!     Ok(())
//! }
//! ```
//!
//! # Counts Notation
//!
//! [`Counts`] prints in the dictionary notation Qiskit uses for
//! `get_counts()`, and [`Counts::parse_qiskit`] reads it back, so output of
//! either tool can be fed to the other.

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod registry;
pub mod result;

pub use backend::{Backend, BackendAvailability, BackendConfig, BackendFactory, ValidationResult};
pub use capability::{Capabilities, GateSet};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use registry::BackendRegistry;
pub use result::{Counts, ExecutionResult};
