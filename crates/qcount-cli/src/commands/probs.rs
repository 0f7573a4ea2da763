//! Probs command implementation.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use qcount_hal::Counts;

/// Turn a printed counts dictionary into `index probability` lines.
///
/// Only non-zero entries are listed, in index order.
pub fn render(text: &str, bits: u32) -> Result<String> {
    let counts = Counts::parse_qiskit(text).context("Failed to parse counts")?;
    debug!(outcomes = counts.len(), shots = counts.total_shots(), "parsed counts");

    let vector = counts.to_probability_vector(bits)?;
    let mut out = String::new();
    for (index, p) in vector.iter().enumerate().filter(|(_, p)| **p > 0.0) {
        out.push_str(&format!("{index} {p}\n"));
    }
    Ok(out)
}

/// Execute the probs command.
pub fn execute(input: Option<&Path>, bits: u32) -> Result<()> {
    let text = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read counts file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read counts from stdin")?;
            buf
        }
    };

    print!("{}", render(&text, bits)?);
    Ok(())
}
