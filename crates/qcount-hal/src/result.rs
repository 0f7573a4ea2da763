//! Execution results.
//!
//! A [`Counts`] histogram maps measured bitstrings to how often they were
//! seen. Bitstrings follow the Qiskit convention: one character per classical
//! bit, classical bit 0 is the rightmost character.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HalError, HalResult};

/// Largest register for which [`Counts::to_probability_vector`] allocates a
/// dense vector.
pub const MAX_PROBABILITY_BITS: u32 = 24;

/// Measurement histogram: bitstring to number of occurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts {
    counts: BTreeMap<String, u64>,
}

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from `(bitstring, count)` pairs.
    ///
    /// Repeated bitstrings accumulate.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, u64)>) -> Self {
        let mut counts = Self::new();
        for (bitstring, count) in pairs {
            counts.insert(bitstring, count);
        }
        counts
    }

    /// Add `count` occurrences of `bitstring`.
    ///
    /// A zero count records nothing. The stored count saturates at
    /// `u64::MAX`; use [`Counts::try_insert`] to reject overflow instead.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        if count == 0 {
            return;
        }
        let entry = self.counts.entry(bitstring.into()).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Add `count` occurrences of `bitstring`, failing if the count overflows.
    pub fn try_insert(&mut self, bitstring: impl Into<String>, count: u64) -> HalResult<()> {
        if count == 0 {
            return Ok(());
        }
        let bitstring = bitstring.into();
        let current = self.get(&bitstring);
        let total = current.checked_add(count).ok_or_else(|| {
            HalError::InvalidCounts(format!("count for '{bitstring}' overflows u64"))
        })?;
        self.counts.insert(bitstring, total);
        Ok(())
    }

    /// Number of occurrences of `bitstring` (0 when never seen).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Number of distinct bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over `(bitstring, count)` in bitstring order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total_shots(&self) -> u64 {
        self.counts
            .values()
            .fold(0_u64, |acc, &count| acc.saturating_add(count))
    }

    /// Outcomes sorted by descending count, ties by bitstring.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut entries: Vec<_> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// The most frequent outcome.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.sorted().into_iter().next()
    }

    /// Relative frequency of each outcome.
    pub fn probabilities(&self) -> BTreeMap<String, f64> {
        let total = self.total_shots();
        if total == 0 {
            return BTreeMap::new();
        }
        self.counts
            .iter()
            .map(|(bits, &count)| (bits.clone(), count as f64 / total as f64))
            .collect()
    }

    /// Dense probability vector over a `num_bits` register.
    ///
    /// Entry `i` holds the frequency of the bitstring whose binary value is
    /// `i` (leftmost character most significant). Outcomes that do not fit
    /// the register are dropped and do not count toward the total.
    pub fn to_probability_vector(&self, num_bits: u32) -> HalResult<Vec<f64>> {
        if num_bits > MAX_PROBABILITY_BITS {
            return Err(HalError::Configuration(format!(
                "probability vector over {num_bits} bits is too large (max {MAX_PROBABILITY_BITS})"
            )));
        }

        let size = 1_usize << num_bits;
        let mut probabilities = vec![0.0; size];
        let mut total = 0_u64;

        for (bits, &count) in &self.counts {
            match u64::from_str_radix(bits, 2) {
                Ok(position) if position < size as u64 => {
                    probabilities[position as usize] += count as f64;
                    total = total.checked_add(count).ok_or_else(|| {
                        HalError::InvalidCounts("total count overflows u64".into())
                    })?;
                }
                _ => warn!(
                    "Skipping outcome '{}' ({} counts): outside a {}-bit register",
                    bits, count, num_bits
                ),
            }
        }

        if total > 0 {
            for p in &mut probabilities {
                *p /= total as f64;
            }
        }
        Ok(probabilities)
    }

    /// Parse Qiskit's `get_counts()` dictionary notation.
    ///
    /// Accepts single or double quotes, arbitrary whitespace and a trailing
    /// comma: `{'00': 512, '11': 488}`. Zero counts are dropped; a repeated
    /// key accumulates and fails once it overflows.
    pub fn parse_qiskit(text: &str) -> HalResult<Self> {
        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| {
                HalError::InvalidCounts(format!("expected a '{{...}}' dictionary, got '{trimmed}'"))
            })?;

        let mut counts = Self::new();
        for entry in body.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry
                .split_once(':')
                .ok_or_else(|| HalError::InvalidCounts(format!("missing ':' in '{entry}'")))?;

            let bits = unquote(key.trim())
                .ok_or_else(|| HalError::InvalidCounts(format!("unquoted key in '{entry}'")))?;
            if bits.is_empty() || !bits.chars().all(|c| c == '0' || c == '1') {
                return Err(HalError::InvalidCounts(format!(
                    "'{bits}' is not a bitstring"
                )));
            }

            let count: u64 = value.trim().parse().map_err(|e| {
                HalError::InvalidCounts(format!("bad count for '{bits}': {e}"))
            })?;
            counts.try_insert(bits, count)?;
        }
        Ok(counts)
    }
}

fn unquote(s: &str) -> Option<&str> {
    ['\'', '"']
        .into_iter()
        .find_map(|q| s.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)))
}

impl fmt::Display for Counts {
    /// Qiskit dictionary notation, most frequent first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (bits, count)) in self.sorted().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{bits}': {count}")?;
        }
        write!(f, "}}")
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Result of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement histogram.
    pub counts: Counts,
    /// Number of shots executed.
    pub shots: u32,
    /// Wall-clock execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Backend-specific metadata.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ExecutionResult {
    /// Create a new result.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Set the execution time.
    #[must_use]
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Check that the counts add up to the shot count.
    pub fn validate(&self) -> HalResult<()> {
        let total = self.counts.total_shots();
        if total != u64::from(self.shots) {
            return Err(HalError::InvalidCounts(format!(
                "counts sum to {total}, expected {} shots",
                self.shots
            )));
        }
        Ok(())
    }
}
