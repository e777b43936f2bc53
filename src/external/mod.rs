//! Benchmark of external programs described in the configuration.

pub mod algorithm;
pub mod suite;
