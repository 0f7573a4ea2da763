//! CLI command implementations.

pub mod common;
pub mod config;
pub mod emit;
pub mod probs;
pub mod run;
pub mod version;
