//! High-level circuit builder API.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};

/// A quantum circuit.
///
/// An ordered list of instructions over a fixed set of qubits and classical
/// bits. Qubit and classical bit ids are dense: the `i`-th qubit has id `i`.
///
/// Deserialization re-validates every instruction, so a decoded circuit
/// holds the same invariants as one built through the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCircuit")]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits in the circuit.
    qubits: Vec<Qubit>,
    /// Classical bits in the circuit.
    clbits: Vec<Clbit>,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            instructions: vec![],
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    fn next_qubit_id(&self) -> QubitId {
        QubitId(self.qubits.len() as u32)
    }

    fn next_clbit_id(&self) -> ClbitId {
        ClbitId(self.clbits.len() as u32)
    }

    /// Add a single qubit to the circuit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = self.next_qubit_id();
        self.qubits.push(Qubit::new(id));
        id
    }

    /// Add a quantum register with multiple qubits.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> Vec<QubitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = self.next_qubit_id();
                self.qubits.push(Qubit::with_register(id, &name, i));
                id
            })
            .collect()
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = self.next_clbit_id();
        self.clbits.push(Clbit::new(id));
        id
    }

    /// Add a classical register with multiple bits.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> Vec<ClbitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = self.next_clbit_id();
                self.clbits.push(Clbit::with_register(id, &name, i));
                id
            })
            .collect()
    }

    /// Append an instruction after validating it against the registers.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.check(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    fn check(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = instruction.as_gate().map(|g| g.name().to_string());

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = instruction.qubits.len() as u32;
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        if instruction.is_measure() && instruction.qubits.len() != instruction.clbits.len() {
            return Err(IrError::MeasureMismatch {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }

        for &qubit in &instruction.qubits {
            if qubit.index() >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if clbit.index() >= self.clbits.len() {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit { qubit, gate_name });
            }
        }

        let mut written = FxHashSet::default();
        for &clbit in &instruction.clbits {
            if !written.insert(clbit) {
                return Err(IrError::DuplicateClbit(clbit));
            }
        }

        Ok(())
    }

    fn single(&mut self, gate: StandardGate, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(gate, qubit))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::S, qubit)
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Sdg, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::T, qubit)
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Tdg, qubit)
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::SX, qubit)
    }

    /// Apply sqrt(X)-dagger gate.
    pub fn sxdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::SXdg, qubit)
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.single(StandardGate::Rx(theta.into()), qubit)
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.single(StandardGate::Ry(theta.into()), qubit)
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.single(StandardGate::Rz(theta.into()), qubit)
    }

    /// Apply phase gate.
    pub fn p(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.single(StandardGate::P(theta.into()), qubit)
    }

    /// Apply universal U gate.
    pub fn u(
        &mut self,
        theta: impl Into<ParameterExpression>,
        phi: impl Into<ParameterExpression>,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.single(
            StandardGate::U(theta.into(), phi.into(), lambda.into()),
            qubit,
        )
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CY gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CY, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    /// Apply an arbitrary gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    // =========================================================================
    // Measurement and barriers
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Measure `qubits[i]` into `clbits[i]` as one compound operation.
    pub fn measure_many(
        &mut self,
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::measure_all(qubits, clbits)?)
    }

    /// Measure all qubits to corresponding classical bits.
    ///
    /// Classical bits are added until there is one per qubit.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        while self.clbits.len() < self.qubits.len() {
            self.add_clbit();
        }

        let qubits: Vec<_> = self.qubits.iter().map(|q| q.id).collect();
        let clbits: Vec<_> = self.clbits.iter().map(|c| c.id).take(qubits.len()).collect();
        self.measure_many(qubits, clbits)
    }

    /// Apply a barrier to all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = self.qubits.iter().map(|q| q.id).collect();
        self.apply(Instruction::barrier(qubits))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the classical bits in the circuit.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of operations. A compound measurement counts once.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Number of operations per instruction name.
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for inst in &self.instructions {
            *counts.entry(inst.name().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Whether the circuit contains at least one measurement.
    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    /// Get the circuit depth: the longest chain of operations sharing a wire.
    pub fn depth(&self) -> usize {
        let mut qubit_level = vec![0usize; self.qubits.len()];
        let mut clbit_level = vec![0usize; self.clbits.len()];
        let mut depth = 0;

        for inst in &self.instructions {
            let q_front = inst.qubits.iter().map(|q| qubit_level[q.index()]);
            let c_front = inst.clbits.iter().map(|c| clbit_level[c.index()]);
            let level = q_front.chain(c_front).max().unwrap_or(0) + 1;

            for q in &inst.qubits {
                qubit_level[q.index()] = level;
            }
            for c in &inst.clbits {
                clbit_level[c.index()] = level;
            }
            depth = depth.max(level);
        }

        depth
    }

    /// Check if any gate has an unbound parameter.
    pub fn is_parameterized(&self) -> bool {
        self.instructions
            .iter()
            .filter_map(Instruction::as_gate)
            .any(|g| g.kind.is_parameterized())
    }

    /// Names of all free parameters, sorted.
    pub fn parameters(&self) -> BTreeSet<String> {
        self.instructions
            .iter()
            .filter_map(Instruction::as_gate)
            .flat_map(|g| g.kind.parameters())
            .flat_map(ParameterExpression::symbols)
            .collect()
    }

    /// Return a copy with every symbol found in `values` bound.
    #[must_use]
    pub fn bind_parameters(&self, values: &HashMap<String, f64>) -> Self {
        let instructions = self
            .instructions
            .iter()
            .map(|inst| match &inst.kind {
                InstructionKind::Gate(gate) => Instruction {
                    kind: InstructionKind::Gate(Gate {
                        kind: gate.kind.bind_parameters(values),
                        label: gate.label.clone(),
                    }),
                    ..inst.clone()
                },
                _ => inst.clone(),
            })
            .collect();

        Self {
            instructions,
            ..self.clone()
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> IrResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON, re-validating every instruction.
    pub fn from_json(source: &str) -> IrResult<Self> {
        let raw: RawCircuit = serde_json::from_str(source)?;
        Self::try_from(raw)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure(QubitId(0), ClbitId(0))?
            .measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        if n == 0 {
            return Ok(Self::new("ghz_0"));
        }

        let mut circuit = Self::with_size("ghz", n, n);
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        circuit.measure_many((0..n).map(QubitId), (0..n).map(ClbitId))?;
        Ok(circuit)
    }

    /// The rotation-layer experiment.
    ///
    /// `n` qubits and `n` classical bits, `rx(theta)` on qubits `0..n` in
    /// order, then a single compound measurement of qubit `i` into bit `i`.
    /// The result has `n + 1` operations.
    pub fn rx_layer(n: u32, theta: impl Into<ParameterExpression>) -> IrResult<Self> {
        let theta = theta.into();
        let mut circuit = Self::with_size("rx_layer", n, n);
        for i in 0..n {
            circuit.rx(theta.clone(), QubitId(i))?;
        }
        circuit.measure_many((0..n).map(QubitId), (0..n).map(ClbitId))?;
        Ok(circuit)
    }
}

/// Wire form of a [`Circuit`] before validation.
#[derive(Deserialize)]
struct RawCircuit {
    name: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    instructions: Vec<Instruction>,
}

impl TryFrom<RawCircuit> for Circuit {
    type Error = IrError;

    fn try_from(raw: RawCircuit) -> IrResult<Self> {
        for (pos, qubit) in raw.qubits.iter().enumerate() {
            if qubit.id.index() != pos {
                return Err(IrError::QubitNotFound {
                    qubit: QubitId(pos as u32),
                    gate_name: None,
                });
            }
        }
        for (pos, clbit) in raw.clbits.iter().enumerate() {
            if clbit.id.index() != pos {
                return Err(IrError::ClbitNotFound {
                    clbit: ClbitId(pos as u32),
                    gate_name: None,
                });
            }
        }

        let mut circuit = Self {
            name: raw.name,
            qubits: raw.qubits,
            clbits: raw.clbits,
            instructions: Vec::with_capacity(raw.instructions.len()),
        };
        for inst in raw.instructions {
            circuit.apply(inst)?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_clbits(), 0);
        assert_eq!(circuit.depth(), 0);
    }

    #[test]
    fn test_add_registers() {
        let mut circuit = Circuit::new("test");
        let qreg = circuit.add_qreg("q", 4);
        let creg = circuit.add_creg("c", 4);

        assert_eq!(qreg, (0..4).map(QubitId).collect::<Vec<_>>());
        assert_eq!(creg.len(), 4);
        assert_eq!(circuit.qubits()[2].to_string(), "q[2]");
    }

    #[test]
    fn test_rx_layer_structure() {
        let circuit = Circuit::rx_layer(16, 0.0).unwrap();
        assert_eq!(circuit.num_qubits(), 16);
        assert_eq!(circuit.num_clbits(), 16);
        assert_eq!(circuit.num_ops(), 17);
        assert_eq!(circuit.depth(), 2);

        let ops = circuit.count_ops();
        assert_eq!(ops["rx"], 16);
        assert_eq!(ops["measure"], 1);

        for (i, inst) in circuit.instructions()[..16].iter().enumerate() {
            assert_eq!(inst.qubits, vec![QubitId(i as u32)]);
            match &inst.as_gate().unwrap().kind {
                StandardGate::Rx(theta) => assert_eq!(theta.as_f64(), Some(0.0)),
                other => panic!("unexpected gate {other:?}"),
            }
        }

        let measure = &circuit.instructions()[16];
        assert!(measure.measured_pairs().all(|(q, c)| q.0 == c.0));
    }

    #[test]
    fn test_bell_state_depth() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.depth(), 3); // H, CX, parallel measures
    }

    #[test]
    fn test_ghz_ops() {
        let circuit = Circuit::ghz(5).unwrap();
        assert_eq!(circuit.num_ops(), 1 + 4 + 1);
        assert!(circuit.has_measurements());
    }

    #[test]
    fn test_unknown_qubit_rejected() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        let err = circuit.rx(0.0, QubitId(2)).unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { qubit: QubitId(2), .. }));
        assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn test_duplicate_operands_rejected() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        assert!(matches!(
            circuit.cx(QubitId(1), QubitId(1)),
            Err(IrError::DuplicateQubit { .. })
        ));
        assert!(matches!(
            circuit.measure_many([QubitId(0), QubitId(1)], [ClbitId(0), ClbitId(0)]),
            Err(IrError::DuplicateClbit(ClbitId(0)))
        ));
        assert!(matches!(
            circuit.measure(QubitId(0), ClbitId(5)),
            Err(IrError::ClbitNotFound { .. })
        ));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        let err = circuit
            .gate(StandardGate::CX, [QubitId(0)])
            .unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_measure_all_adds_clbits() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.h(QubitId(0)).unwrap().measure_all().unwrap();
        assert_eq!(circuit.num_clbits(), 3);
        assert_eq!(circuit.num_ops(), 2);
    }

    #[test]
    fn test_parameter_binding() {
        let circuit = Circuit::rx_layer(3, ParameterExpression::symbol("theta")).unwrap();
        assert!(circuit.is_parameterized());
        assert_eq!(
            circuit.parameters().into_iter().collect::<Vec<_>>(),
            vec!["theta".to_string()]
        );

        let bound = circuit.bind_parameters(&HashMap::from([("theta".to_string(), PI)]));
        assert!(!bound.is_parameterized());
        assert_eq!(bound.num_ops(), circuit.num_ops());
    }

    #[test]
    fn test_json_round_trip_revalidates() {
        let circuit = Circuit::rx_layer(4, PI / 2.0).unwrap();
        let json = circuit.to_json().unwrap();
        assert_eq!(Circuit::from_json(&json).unwrap(), circuit);
    }

    #[test]
    fn test_from_json_rejects_out_of_range_qubit() {
        let json = r#"{
            "name": "broken",
            "qubits": [{"id": 0}],
            "clbits": [],
            "instructions": [{"kind": {"Gate": {"kind": "H"}}, "qubits": [3]}]
        }"#;
        assert!(matches!(
            Circuit::from_json(json),
            Err(IrError::QubitNotFound { qubit: QubitId(3), .. })
        ));
    }

    #[test]
    fn test_serde_rejects_out_of_range_clbit() {
        let json = r#"{
            "name": "broken",
            "qubits": [{"id": 0}],
            "clbits": [{"id": 0}],
            "instructions": [{"kind": "Measure", "qubits": [0], "clbits": [5]}]
        }"#;
        let err = serde_json::from_str::<Circuit>(json).unwrap_err();
        assert!(err.to_string().contains("not found"), "{err}");
        assert!(matches!(
            Circuit::from_json(json),
            Err(IrError::ClbitNotFound { clbit: ClbitId(5), .. })
        ));
    }
}
