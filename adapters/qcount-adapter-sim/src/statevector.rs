//! Statevector simulation engine.
//!
//! Qubit `k` is bit `k` of the basis index, so `|q1 q0> = |10>` is
//! amplitude 2.

use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, PI};

use qcount_hal::{HalError, HalResult};
use qcount_ir::{Instruction, InstructionKind, StandardGate};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// Row-major 2x2 unitary.
type Matrix2 = [[Complex64; 2]; 2];

/// A statevector representing a quantum state.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0>.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Amplitudes in basis-index order.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Apply an instruction to the statevector.
    ///
    /// Measurements and barriers leave the state untouched; sampling happens
    /// after the whole circuit has been applied.
    pub fn apply(&mut self, instruction: &Instruction) -> HalResult<()> {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let qubits: Vec<usize> = instruction.qubits.iter().map(|q| q.index()).collect();
                if qubits.len() != gate.num_qubits() as usize {
                    return Err(HalError::InvalidCircuit(format!(
                        "'{}' expects {} qubits, got {}",
                        gate.name(),
                        gate.num_qubits(),
                        qubits.len()
                    )));
                }
                if let Some(&q) = qubits.iter().find(|&&q| q >= self.num_qubits) {
                    return Err(HalError::InvalidCircuit(format!(
                        "'{}' acts on qubit {} of a {}-qubit state",
                        gate.name(),
                        q,
                        self.num_qubits
                    )));
                }
                self.apply_standard_gate(&gate.kind, &qubits)
            }
            InstructionKind::Measure | InstructionKind::Barrier => Ok(()),
        }
    }

    fn apply_standard_gate(&mut self, gate: &StandardGate, qubits: &[usize]) -> HalResult<()> {
        match gate {
            StandardGate::I => {}
            StandardGate::X => self.apply_single(qubits[0], &x_matrix()),
            StandardGate::Y => self.apply_single(qubits[0], &[[ZERO, -I], [I, ZERO]]),
            StandardGate::Z => self.apply_single(qubits[0], &phase_matrix(PI)),
            StandardGate::H => {
                let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                self.apply_single(qubits[0], &[[h, h], [h, -h]]);
            }
            StandardGate::S => self.apply_single(qubits[0], &phase_matrix(FRAC_PI_2)),
            StandardGate::Sdg => self.apply_single(qubits[0], &phase_matrix(-FRAC_PI_2)),
            StandardGate::T => self.apply_single(qubits[0], &phase_matrix(FRAC_PI_4)),
            StandardGate::Tdg => self.apply_single(qubits[0], &phase_matrix(-FRAC_PI_4)),
            StandardGate::SX => self.apply_single(qubits[0], &sx_matrix(1.0)),
            StandardGate::SXdg => self.apply_single(qubits[0], &sx_matrix(-1.0)),
            StandardGate::Rx(theta) => self.apply_single(qubits[0], &rx_matrix(theta.value()?)),
            StandardGate::Ry(theta) => self.apply_single(qubits[0], &ry_matrix(theta.value()?)),
            StandardGate::Rz(theta) => self.apply_single(qubits[0], &rz_matrix(theta.value()?)),
            StandardGate::P(lambda) => self.apply_single(qubits[0], &phase_matrix(lambda.value()?)),
            StandardGate::U(theta, phi, lambda) => self.apply_single(
                qubits[0],
                &u_matrix(theta.value()?, phi.value()?, lambda.value()?),
            ),
            StandardGate::CX => self.apply_controlled(&qubits[..1], qubits[1], &x_matrix()),
            StandardGate::CY => {
                self.apply_controlled(&qubits[..1], qubits[1], &[[ZERO, -I], [I, ZERO]]);
            }
            StandardGate::CZ => self.apply_controlled(&qubits[..1], qubits[1], &phase_matrix(PI)),
            StandardGate::Swap => self.apply_swap(qubits[0], qubits[1]),
            StandardGate::CCX => self.apply_controlled(&qubits[..2], qubits[2], &x_matrix()),
        }
        Ok(())
    }

    fn apply_single(&mut self, target: usize, matrix: &Matrix2) {
        self.apply_controlled(&[], target, matrix);
    }

    /// Apply `matrix` to `target` on the subspace where every control is 1.
    fn apply_controlled(&mut self, controls: &[usize], target: usize, matrix: &Matrix2) {
        let ctrl_mask = controls.iter().fold(0_usize, |mask, &c| mask | (1 << c));
        let tgt_mask = 1 << target;

        for i in 0..self.amplitudes.len() {
            if i & tgt_mask == 0 && i & ctrl_mask == ctrl_mask {
                let j = i | tgt_mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = matrix[0][0] * a + matrix[0][1] * b;
                self.amplitudes[j] = matrix[1][0] * a + matrix[1][1] * b;
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.amplitudes.len() {
            if i & mask1 != 0 && i & mask2 == 0 {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    /// Probability of each basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Squared norm of the state; 1 up to rounding for any unitary evolution.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }
}

fn x_matrix() -> Matrix2 {
    [[ZERO, ONE], [ONE, ZERO]]
}

fn phase_matrix(lambda: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, lambda)]]
}

/// sqrt(X) for `sign = 1.0`, its adjoint for `sign = -1.0`.
fn sx_matrix(sign: f64) -> Matrix2 {
    let p = Complex64::new(0.5, 0.5 * sign);
    let m = Complex64::new(0.5, -0.5 * sign);
    [[p, m], [m, p]]
}

fn rx_matrix(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry_matrix(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz_matrix(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn u_matrix(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        [Complex64::new(c, 0.0), -Complex64::from_polar(s, lambda)],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcount_ir::{IrError, ParameterExpression, QubitId};

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn gate(g: StandardGate, qubits: &[u32]) -> Instruction {
        Instruction::gate(g, qubits.iter().map(|&q| QubitId(q)))
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes()[0], ONE));
        assert!(sv.amplitudes()[1..].iter().all(|&a| approx_eq(a, ZERO)));
        assert!((sv.norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rx_zero_is_identity() {
        let mut sv = Statevector::new(3);
        for q in 0..3 {
            sv.apply(&gate(StandardGate::Rx(0.0.into()), &[q])).unwrap();
        }
        assert_eq!(sv.probabilities()[0], 1.0);
        assert!(sv.probabilities()[1..].iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_rx_pi_flips() {
        let mut sv = Statevector::new(1);
        sv.apply(&gate(StandardGate::Rx(PI.into()), &[0])).unwrap();
        assert!((sv.probabilities()[1] - 1.0).abs() < 1e-12);
        assert!(approx_eq(sv.amplitudes()[1], Complex64::new(0.0, -1.0)));
    }

    #[test]
    fn test_hadamard() {
        let mut sv = Statevector::new(1);
        sv.apply(&gate(StandardGate::H, &[0])).unwrap();

        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(sv.amplitudes()[0], h));
        assert!(approx_eq(sv.amplitudes()[1], h));
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply(&gate(StandardGate::H, &[0])).unwrap();
        sv.apply(&gate(StandardGate::CX, &[0, 1])).unwrap();

        let probs = sv.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!(probs[1].abs() < 1e-12);
        assert!(probs[2].abs() < 1e-12);
        assert!((probs[3] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_qubit_is_little_endian() {
        let mut sv = Statevector::new(3);
        sv.apply(&gate(StandardGate::X, &[1])).unwrap();
        assert!(approx_eq(sv.amplitudes()[0b010], ONE));
    }

    #[test]
    fn test_sx_squared_is_x() {
        let mut sv = Statevector::new(1);
        sv.apply(&gate(StandardGate::SX, &[0])).unwrap();
        sv.apply(&gate(StandardGate::SX, &[0])).unwrap();
        assert!(approx_eq(sv.amplitudes()[1], ONE));

        sv.apply(&gate(StandardGate::SXdg, &[0])).unwrap();
        sv.apply(&gate(StandardGate::SXdg, &[0])).unwrap();
        assert!(approx_eq(sv.amplitudes()[0], ONE));
    }

    #[test]
    fn test_u_matches_ry() {
        let mut via_u = Statevector::new(1);
        via_u
            .apply(&gate(
                StandardGate::U(0.7.into(), 0.0.into(), 0.0.into()),
                &[0],
            ))
            .unwrap();
        let mut via_ry = Statevector::new(1);
        via_ry.apply(&gate(StandardGate::Ry(0.7.into()), &[0])).unwrap();

        for (a, b) in via_u.amplitudes().iter().zip(via_ry.amplitudes()) {
            assert!(approx_eq(*a, *b));
        }
    }

    #[test]
    fn test_swap_and_toffoli() {
        let mut sv = Statevector::new(3);
        sv.apply(&gate(StandardGate::X, &[0])).unwrap();
        sv.apply(&gate(StandardGate::Swap, &[0, 1])).unwrap();
        assert!(approx_eq(sv.amplitudes()[0b010], ONE));

        sv.apply(&gate(StandardGate::X, &[0])).unwrap();
        sv.apply(&gate(StandardGate::CCX, &[0, 1, 2])).unwrap();
        assert!(approx_eq(sv.amplitudes()[0b111], ONE));
    }

    #[test]
    fn test_phase_gates_preserve_probabilities() {
        let mut sv = Statevector::new(2);
        sv.apply(&gate(StandardGate::H, &[0])).unwrap();
        for g in [
            StandardGate::S,
            StandardGate::T,
            StandardGate::Z,
            StandardGate::Tdg,
            StandardGate::Sdg,
            StandardGate::Rz(1.3.into()),
            StandardGate::P(0.4.into()),
        ] {
            sv.apply(&gate(g, &[0])).unwrap();
        }
        sv.apply(&gate(StandardGate::CZ, &[0, 1])).unwrap();
        let probs = sv.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!((probs[1] - 0.5).abs() < 1e-12);
        assert!((sv.norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unbound_parameter_is_an_error() {
        let mut sv = Statevector::new(1);
        let result = sv.apply(&gate(
            StandardGate::Rx(ParameterExpression::symbol("theta")),
            &[0],
        ));
        assert!(matches!(
            result,
            Err(HalError::Ir(IrError::UnboundParameter(_)))
        ));
    }

    #[test]
    fn test_out_of_range_qubit_is_an_error() {
        let mut sv = Statevector::new(2);
        let result = sv.apply(&gate(StandardGate::X, &[5]));
        assert!(matches!(result, Err(HalError::InvalidCircuit(_))));
    }

    #[test]
    fn test_measure_and_barrier_are_no_ops() {
        let mut sv = Statevector::new(2);
        sv.apply(&Instruction::measure(QubitId(0), 0.into())).unwrap();
        sv.apply(&Instruction::barrier([QubitId(0), QubitId(1)])).unwrap();
        assert!(approx_eq(sv.amplitudes()[0], ONE));
    }
}
