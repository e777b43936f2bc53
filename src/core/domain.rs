use std::time::Duration;

use crate::constants::INVALID_TIME_MS;

/// Outcome of one algorithm run, written as one row of `data.csv`.
///
/// A fresh record starts in the failed state, so a run that never got as far
/// as launching the process still yields definite values.
#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord<R> {
    /// `false` when the process was killed by the timeout or never started.
    pub terminated_in_time: bool,
    /// `true` only if nothing was written to stderr and the results parsed.
    pub no_error: bool,
    /// Elapsed milliseconds, or [`INVALID_TIME_MS`] when unmeasured.
    pub time_ms: i64,
    pub payload: Option<R>,
}

impl<R> Default for RunRecord<R> {
    fn default() -> Self {
        Self {
            terminated_in_time: false,
            no_error: false,
            time_ms: INVALID_TIME_MS,
            payload: None,
        }
    }
}

impl<R> RunRecord<R> {
    pub fn mark_failed(&mut self) {
        self.terminated_in_time = false;
        self.no_error = false;
        self.time_ms = INVALID_TIME_MS;
    }

    pub fn record_measurement(&mut self, measurement: &Measurement) {
        self.terminated_in_time = measurement.terminated_in_time;
        self.no_error = measurement.no_error;
        self.time_ms = i64::try_from(measurement.elapsed.as_millis()).unwrap_or(i64::MAX);
    }

    pub fn time(&self) -> Option<Duration> {
        u64::try_from(self.time_ms).ok().map(Duration::from_millis)
    }

    pub fn is_success(&self) -> bool {
        self.terminated_in_time && self.no_error
    }
}

/// What the process lifecycle itself observed, before result parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement {
    pub terminated_in_time: bool,
    pub no_error: bool,
    pub elapsed: Duration,
}

/// One entry of the systems list. `id` is the 1-based position among the
/// accepted names and is used as `ModelID` in every CSV file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemEntry {
    pub id: u32,
    pub name: String,
}

/// Where the benchmark loop currently is. Indices are 0-based, iterations
/// are 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunContext {
    pub system_index: usize,
    pub system_count: usize,
    pub system_iteration: u32,
    pub system_iterations: u32,
    pub algorithm_index: usize,
    pub algorithm_count: usize,
    pub algorithm_iteration: u32,
    pub algorithm_iterations: u32,
}

impl RunContext {
    pub fn progress(&self, full_name: &str) -> String {
        format!(
            "{}/{} | {}/{} | ({}/{}) {} | {}/{}",
            self.system_index + 1,
            self.system_count,
            self.system_iteration,
            self.system_iterations,
            self.algorithm_index + 1,
            self.algorithm_count,
            full_name,
            self.algorithm_iteration,
            self.algorithm_iterations,
        )
    }
}
