//! Qiskit script rendering.
//!
//! Renders a [`Circuit`] as a self-contained Python script that builds the
//! same circuit with Qiskit, executes it and prints the counts dictionary.
//! The script is only produced here; running it is left to the caller.
//!
//! ```rust
//! use qcount_ir::{Circuit, QiskitScript};
//!
//! let circuit = Circuit::rx_layer(2, 0.0).unwrap();
//! let script = QiskitScript::for_simulator(1000).render(&circuit).unwrap();
//!
//! assert!(script.contains("qc = QuantumCircuit(2,2)"));
//! assert!(script.contains("qc.rx(0, 1)"));
//! assert!(script.contains("qc.measure([0,1], [0,1])"));
//! assert!(script.contains("job = execute(qc, simulator, shots=1000)"));
//! ```

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::IrResult;
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;

/// Device used when none is named for hardware runs.
pub const DEFAULT_IBMQ_BACKEND: &str = "ibmq_16_melbourne";

/// Where the rendered script sends the circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QiskitTarget {
    /// Aer's local `qasm_simulator`.
    Simulator,
    /// An IBM Quantum device reached through a saved account.
    Ibmq {
        /// Device name, e.g. `ibmq_16_melbourne`.
        backend: String,
    },
}

/// Builder for a runnable Qiskit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QiskitScript {
    /// Execution target.
    pub target: QiskitTarget,
    /// Number of shots passed to `execute`.
    pub shots: u32,
}

impl QiskitScript {
    /// Script that runs on the local Aer simulator.
    pub fn for_simulator(shots: u32) -> Self {
        Self {
            target: QiskitTarget::Simulator,
            shots,
        }
    }

    /// Script that runs on an IBM Quantum device.
    pub fn for_ibmq(shots: u32, backend: impl Into<String>) -> Self {
        Self {
            target: QiskitTarget::Ibmq {
                backend: backend.into(),
            },
            shots,
        }
    }

    /// Render the full script for `circuit`.
    ///
    /// Fails with [`crate::IrError::UnboundParameter`] if any angle is symbolic.
    pub fn render(&self, circuit: &Circuit) -> IrResult<String> {
        let mut out = String::new();

        let provider = match self.target {
            QiskitTarget::Simulator => "Aer",
            QiskitTarget::Ibmq { .. } => "IBMQ",
        };
        out.push_str("from qiskit import(\n  QuantumCircuit,\n  execute,\n  ");
        out.push_str(provider);
        out.push_str(")\n\n");

        if self.target == QiskitTarget::Simulator {
            out.push_str("simulator = Aer.get_backend('qasm_simulator')\n\n");
        }

        out.push_str(&circuit_body(circuit)?);
        out.push('\n');

        match &self.target {
            QiskitTarget::Simulator => {
                let _ = writeln!(out, "job = execute(qc, simulator, shots={})", self.shots);
            }
            QiskitTarget::Ibmq { backend } => {
                out.push_str("IBMQ.load_account()\n");
                out.push_str("provider = IBMQ.get_provider(hub = 'ibm-q')\n");
                let _ = writeln!(out, "device = provider.get_backend('{backend}')");
                let _ = writeln!(
                    out,
                    "job = execute(qc, backend = device, shots={})",
                    self.shots
                );
            }
        }

        out.push_str("\nresult = job.result()\ncounts = result.get_counts(qc)\nprint(counts)\n");
        Ok(out)
    }
}

/// The `qc = QuantumCircuit(..)` line plus one line per instruction.
pub fn circuit_body(circuit: &Circuit) -> IrResult<String> {
    let mut out = format!(
        "qc = QuantumCircuit({},{})\n",
        circuit.num_qubits(),
        circuit.num_clbits()
    );
    for inst in circuit.instructions() {
        out.push_str(&instruction_line(inst)?);
        out.push('\n');
    }
    Ok(out)
}

fn instruction_line(inst: &Instruction) -> IrResult<String> {
    let qargs = join(inst.qubits.iter().map(|q| q.0), ", ");
    Ok(match &inst.kind {
        InstructionKind::Gate(gate) => {
            let params = gate
                .kind
                .parameters()
                .into_iter()
                .map(angle)
                .collect::<IrResult<Vec<_>>>()?;
            if params.is_empty() {
                format!("qc.{}({qargs})", python_name(&gate.kind))
            } else {
                format!(
                    "qc.{}({}, {qargs})",
                    python_name(&gate.kind),
                    params.join(", ")
                )
            }
        }
        InstructionKind::Measure if inst.qubits.len() == 1 => {
            format!("qc.measure({}, {})", inst.qubits[0].0, inst.clbits[0].0)
        }
        InstructionKind::Measure => format!(
            "qc.measure([{}], [{}])",
            join(inst.qubits.iter().map(|q| q.0), ","),
            join(inst.clbits.iter().map(|c| c.0), ",")
        ),
        InstructionKind::Barrier => format!("qc.barrier({qargs})"),
    })
}

/// Qiskit's `QuantumCircuit` method name for a gate.
fn python_name(gate: &StandardGate) -> &'static str {
    match gate {
        StandardGate::I => "id",
        other => other.name(),
    }
}

fn angle(expr: &ParameterExpression) -> IrResult<String> {
    Ok(format!("{}", expr.value()?))
}

fn join(items: impl Iterator<Item = u32>, sep: &str) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrError;
    use crate::qubit::{ClbitId, QubitId};

    #[test]
    fn test_rx_layer_script_matches_reference() {
        let circuit = Circuit::rx_layer(16, 0.0).unwrap();
        let script = QiskitScript::for_simulator(1000).render(&circuit).unwrap();

        let mut expected = String::from(
            "from qiskit import(\n  QuantumCircuit,\n  execute,\n  Aer)\n\n\
             simulator = Aer.get_backend('qasm_simulator')\n\n\
             qc = QuantumCircuit(16,16)\n",
        );
        for i in 0..16 {
            expected.push_str(&format!("qc.rx(0, {i})\n"));
        }
        let idx = (0..16).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        expected.push_str(&format!("qc.measure([{idx}], [{idx}])\n"));
        expected.push_str(
            "\njob = execute(qc, simulator, shots=1000)\n\n\
             result = job.result()\ncounts = result.get_counts(qc)\nprint(counts)\n",
        );

        assert_eq!(script, expected);
    }

    #[test]
    fn test_ibmq_script() {
        let circuit = Circuit::bell().unwrap();
        let script = QiskitScript::for_ibmq(512, DEFAULT_IBMQ_BACKEND)
            .render(&circuit)
            .unwrap();

        assert!(script.contains("  IBMQ)\n"));
        assert!(!script.contains("Aer"));
        assert!(script.contains("device = provider.get_backend('ibmq_16_melbourne')"));
        assert!(script.contains("job = execute(qc, backend = device, shots=512)"));
        assert!(script.contains("qc.h(0)\nqc.cx(0, 1)\nqc.measure(0, 0)\nqc.measure(1, 1)\n"));
    }

    #[test]
    fn test_multi_parameter_and_barrier_lines() {
        let mut circuit = Circuit::with_size("u", 2, 1);
        circuit
            .u(1.5, 0.0, -0.5, QubitId(1))
            .unwrap()
            .barrier_all()
            .unwrap()
            .gate(StandardGate::I, [QubitId(0)])
            .unwrap()
            .measure(QubitId(1), ClbitId(0))
            .unwrap();

        let body = circuit_body(&circuit).unwrap();
        assert_eq!(
            body,
            "qc = QuantumCircuit(2,1)\nqc.u(1.5, 0, -0.5, 1)\nqc.barrier(0, 1)\nqc.id(0)\nqc.measure(1, 0)\n"
        );
    }

    #[test]
    fn test_symbolic_angle_cannot_render() {
        let circuit = Circuit::rx_layer(1, ParameterExpression::symbol("theta")).unwrap();
        let err = QiskitScript::for_simulator(10).render(&circuit).unwrap_err();
        assert!(matches!(err, IrError::UnboundParameter(name) if name == "theta"));
    }
}
