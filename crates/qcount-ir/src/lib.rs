//! qcount Circuit Intermediate Representation
//!
//! This crate provides the data structures for describing the quantum circuits
//! that qcount samples: qubits and classical bits, gates, instructions and an
//! ordered circuit builder.
//!
//! # Overview
//!
//! A [`Circuit`] is an ordered list of [`Instruction`]s over a fixed qubit
//! register and a fixed classical register. Every append is validated against
//! the registers, so a circuit that was built successfully is always well
//! formed.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] for the built-in gate set
//! - **Parameters**: [`ParameterExpression`] for symbolic rotation angles
//! - **Instructions**: [`Instruction`] combining a gate or measurement with its operands
//! - **Circuit**: [`Circuit`] high-level builder API
//! - **Qiskit**: [`QiskitScript`] renders a circuit as a runnable Qiskit script
//!
//! # Example: The Rx Layer Experiment
//!
//! ```rust
//! use qcount_ir::Circuit;
//!
//! // 16 qubits, rx(0) on each, then one compound measurement
//! let circuit = Circuit::rx_layer(16, 0.0).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 16);
//! assert_eq!(circuit.num_clbits(), 16);
//! assert_eq!(circuit.num_ops(), 17);
//! ```
//!
//! # Example: Parameterized Circuit
//!
//! ```rust
//! use qcount_ir::{Circuit, QubitId, ParameterExpression};
//! use std::collections::HashMap;
//! use std::f64::consts::PI;
//!
//! let mut circuit = Circuit::with_size("variational", 1, 1);
//! circuit
//!     .rx(ParameterExpression::symbol("theta"), QubitId(0))
//!     .unwrap();
//! assert!(circuit.is_parameterized());
//!
//! let bound = circuit.bind_parameters(&HashMap::from([("theta".to_string(), PI)]));
//! assert!(!bound.is_parameterized());
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `I` | 1 | Identity |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `H` | 1 | Hadamard gate |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase gates |
//! | `SX`, `SXdg` | 1 | sqrt(X) and its inverse |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `P` | 1 | Phase gate P(λ) |
//! | `U` | 1 | Universal single-qubit gate U(θ,φ,λ) |
//! | `CX`, `CY`, `CZ` | 2 | Controlled Pauli gates |
//! | `Swap` | 2 | SWAP gate |
//! | `CCX` | 3 | Toffoli (CCNOT) gate |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qiskit;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{Gate, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use qiskit::{QiskitScript, QiskitTarget};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId};
