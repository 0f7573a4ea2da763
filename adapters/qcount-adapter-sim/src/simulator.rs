//! Simulator backend implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};
use uuid::Uuid;

use qcount_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, Job, JobId, JobStatus, ValidationResult,
};
use qcount_ir::{Circuit, InstructionKind};

use crate::statevector::Statevector;

/// Qubit limit when none is configured.
pub const DEFAULT_MAX_QUBITS: u32 = 20;

/// Hard ceiling on the statevector size (2^30 amplitudes, 16 GiB).
pub const MAX_STATEVECTOR_QUBITS: u32 = 30;

/// Local simulator backend.
///
/// Circuits are evolved once as a statevector and shots are sampled from the
/// final distribution, so the cost of a job is dominated by the qubit count,
/// not the shot count.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Active jobs.
    jobs: Arc<Mutex<FxHashMap<String, Job>>>,
    /// RNG seed; every job starts from it when set.
    seed: Option<u64>,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(DEFAULT_MAX_QUBITS)
    }

    /// Create a simulator with custom max qubits.
    ///
    /// Values above [`MAX_STATEVECTOR_QUBITS`] are clamped.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            config: BackendConfig::new("simulator"),
            capabilities: Capabilities::simulator(max_qubits.min(MAX_STATEVECTOR_QUBITS)),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            seed: None,
        }
    }

    /// Make sampling reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The configured seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn jobs(&self) -> MutexGuard<'_, FxHashMap<String, Job>> {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }

    fn check_shots(&self, shots: u32) -> HalResult<()> {
        let max = self.capabilities.max_shots;
        if shots == 0 || shots > max {
            return Err(HalError::InvalidShots(format!(
                "{shots} shots requested, simulator accepts 1..={max}"
            )));
        }
        Ok(())
    }

    fn check_size(&self, circuit: &Circuit) -> HalResult<()> {
        let max = self.capabilities.num_qubits;
        if circuit.num_qubits() > max as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                max
            )));
        }
        Ok(())
    }

    fn check_gates(&self, circuit: &Circuit) -> HalResult<()> {
        let gate_set = &self.capabilities.gate_set;
        match circuit
            .instructions()
            .iter()
            .filter_map(|inst| inst.as_gate())
            .find(|gate| !gate_set.contains(gate.name()))
        {
            Some(gate) => Err(HalError::Unsupported(format!(
                "gate '{}' is not supported by the simulator",
                gate.name()
            ))),
            None => Ok(()),
        }
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit), fields(qubits = circuit.num_qubits()))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
        let start = Instant::now();
        let mapping = measurement_map(circuit)?;

        let mut sv = Statevector::new(circuit.num_qubits());
        for inst in circuit.instructions() {
            sv.apply(inst)?;
        }
        debug!("Applied {} instructions", circuit.num_ops());

        let outcomes = sample(&sv.probabilities(), shots, &mut self.rng());
        let num_clbits = circuit.num_clbits();
        let counts: Counts = outcomes
            .into_iter()
            .map(|(index, n)| (to_bitstring(index, &mapping, num_clbits), n))
            .collect();

        let elapsed = start.elapsed();
        debug!(
            "Simulation completed in {:?}: {} distinct outcomes",
            elapsed,
            counts.len()
        );

        let mut result = ExecutionResult::new(counts, shots)
            .with_execution_time(elapsed.as_millis() as u64)
            .with_metadata("backend", serde_json::json!(self.config.name));
        if let Some(seed) = self.seed {
            result = result.with_metadata("seed", serde_json::json!(seed));
        }
        Ok(result)
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect `(qubit, clbit)` pairs from every measurement.
///
/// A later measurement into the same clbit replaces an earlier one.
/// Gates after a measurement on the same qubit are rejected.
fn measurement_map(circuit: &Circuit) -> HalResult<Vec<(usize, usize)>> {
    let mut by_clbit: FxHashMap<usize, usize> = FxHashMap::default();
    let mut measured: FxHashSet<usize> = FxHashSet::default();

    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Measure => {
                for (q, c) in inst.measured_pairs() {
                    by_clbit.insert(c.index(), q.index());
                    measured.insert(q.index());
                }
            }
            InstructionKind::Gate(gate) => {
                if let Some(q) = inst.qubits.iter().find(|q| measured.contains(&q.index())) {
                    return Err(HalError::Unsupported(format!(
                        "'{}' on {} after it was measured (mid-circuit measurement)",
                        gate.name(),
                        q
                    )));
                }
            }
            InstructionKind::Barrier => {}
        }
    }

    if by_clbit.is_empty() {
        return Err(HalError::InvalidCircuit(
            "circuit has no measurements".into(),
        ));
    }

    let mut mapping: Vec<(usize, usize)> = by_clbit.into_iter().map(|(c, q)| (q, c)).collect();
    mapping.sort_unstable_by_key(|&(_, c)| c);
    Ok(mapping)
}

/// Draw `shots` basis indices from `probabilities`.
///
/// Binary search over the cumulative distribution; the result maps each
/// observed index to its number of occurrences.
fn sample(probabilities: &[f64], shots: u32, rng: &mut impl Rng) -> FxHashMap<usize, u64> {
    let cumulative: Vec<f64> = probabilities
        .iter()
        .scan(0.0, |acc, &p| {
            *acc += p;
            Some(*acc)
        })
        .collect();
    let total = cumulative.last().copied().unwrap_or(0.0);
    let last = cumulative.len().saturating_sub(1);

    let mut outcomes: FxHashMap<usize, u64> = FxHashMap::default();
    for _ in 0..shots {
        let r = rng.r#gen::<f64>() * total;
        let index = cumulative.partition_point(|&c| c <= r).min(last);
        *outcomes.entry(index).or_insert(0) += 1;
    }
    outcomes
}

/// Read the classical register for basis state `index`.
///
/// Clbit 0 is the rightmost character; clbits nobody measured read `0`.
fn to_bitstring(index: usize, mapping: &[(usize, usize)], num_clbits: usize) -> String {
    let mut bits = vec![b'0'; num_clbits];
    for &(qubit, clbit) in mapping {
        if (index >> qubit) & 1 == 1 {
            bits[num_clbits - 1 - clbit] = b'1';
        }
    }
    String::from_utf8_lossy(&bits).into_owned()
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let mut reasons = Vec::new();

        if let Err(e) = self.check_size(circuit) {
            reasons.push(e.to_string());
        }
        if let Err(e) = self.check_gates(circuit) {
            reasons.push(e.to_string());
        }
        if let Err(e) = measurement_map(circuit) {
            reasons.push(e.to_string());
        }

        Ok(ValidationResult::from_reasons(reasons))
    }

    #[instrument(skip(self, circuit, parameters))]
    async fn submit(
        &self,
        circuit: &Circuit,
        shots: u32,
        parameters: Option<&HashMap<String, f64>>,
    ) -> HalResult<JobId> {
        self.check_shots(shots)?;
        self.check_size(circuit)?;
        self.check_gates(circuit)?;

        let bound;
        let circuit = match parameters {
            Some(values) if !values.is_empty() => {
                bound = circuit.bind_parameters(values);
                &bound
            }
            _ => circuit,
        };

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let mut job = Job::new(job_id.clone(), self.config.name.clone(), shots);
        job.start()?;
        self.jobs().insert(job_id.0.clone(), job);
        debug!("Submitted job: {}", job_id);

        let outcome = self.run_simulation(circuit, shots);

        let mut jobs = self.jobs();
        let job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match outcome.and_then(|result| job.complete(result)) {
            Ok(()) => Ok(job_id),
            Err(e) => {
                job.fail(e.to_string())?;
                Err(e)
            }
        }
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.jobs()
            .get(&job_id.0)
            .map(|job| job.status().clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let jobs = self.jobs();
        let job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        job.result().cloned()
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.jobs();
        let job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if !job.cancel() {
            debug!("Job {} already finished; cancel ignored", job_id);
        }
        Ok(())
    }
}

impl BackendFactory for SimulatorBackend {
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = match config.get_u64("max_qubits")? {
            None => DEFAULT_MAX_QUBITS,
            Some(n) if n <= u64::from(MAX_STATEVECTOR_QUBITS) => n as u32,
            Some(n) => {
                return Err(HalError::Configuration(format!(
                    "max_qubits = {n} exceeds the statevector limit of {MAX_STATEVECTOR_QUBITS}"
                )));
            }
        };
        let seed = config.get_u64("seed")?;
        debug!(
            "Configured simulator '{}': max_qubits={}, seed={:?}",
            config.name, max_qubits, seed
        );

        Ok(Self {
            capabilities: Capabilities::simulator(max_qubits),
            config,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            seed,
        })
    }
}
