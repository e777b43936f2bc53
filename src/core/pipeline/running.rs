use std::{pin::pin, sync::Arc, time::Duration};

use nix::{
    errno::Errno,
    sys::signal::{Signal, killpg},
    unistd::Pid,
};
use tokio::{
    process::Child,
    time::{Instant, timeout},
};

use crate::constants::DRAIN_GRACE;
use crate::core::{
    domain::{Measurement, RunRecord},
    errors::RunError,
    streams::{
        pump::StreamPump,
        readers::{ErrorCollector, LogReader, StreamKind},
    },
    traits::{algorithm::Algorithm, launcher::Launcher, reader::OutputReader},
};

/// Runs one algorithm as a subprocess and turns whatever happens into a
/// [`RunRecord`]. Nothing escapes [`ProcessRunner::run`]: every failure is
/// logged and recorded instead.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    launcher: Arc<dyn Launcher>,
    timeout: Option<Duration>,
    verbose: bool,
}

impl ProcessRunner {
    pub fn new(launcher: Arc<dyn Launcher>) -> Self {
        Self {
            launcher,
            timeout: None,
            verbose: false,
        }
    }

    /// `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[tracing::instrument(skip_all, fields(algorithm = %algorithm.full_name()))]
    pub async fn run<A: Algorithm>(&self, algorithm: &mut A) -> RunRecord<A::Output> {
        let mut record = RunRecord::default();

        match self.execute(algorithm).await {
            Ok(measurement) => record.record_measurement(&measurement),
            Err(err) => {
                tracing::error!("Run failed: {}", err);
                record.mark_failed();
            }
        }

        match algorithm.parse_results() {
            Ok(payload) => record.payload = Some(payload),
            Err(err) => {
                tracing::error!("Failed to parse results: {}", err);
                if record.terminated_in_time {
                    record.no_error = false;
                }
            }
        }

        if let Err(err) = algorithm.post_process() {
            tracing::error!("Post-processing failed: {}", err);
        }

        tracing::debug!(
            success = record.is_success(),
            terminated_in_time = record.terminated_in_time,
            no_error = record.no_error,
            time_ms = record.time_ms,
            "Run finished"
        );
        record
    }

    async fn execute<A: Algorithm>(&self, algorithm: &mut A) -> Result<Measurement, RunError> {
        algorithm.pre_process().map_err(RunError::PreProcess)?;
        tracing::info!(command = %algorithm.command(), "Starting process");

        let command = algorithm.command_elements().to_vec();
        if command.is_empty() {
            return Err(RunError::EmptyCommand);
        }

        let mut out_logger = LogReader::new(StreamKind::Stdout, self.verbose);
        let mut err_logger = LogReader::new(StreamKind::Stderr, self.verbose);
        let mut errors = ErrorCollector::default();

        let start = Instant::now();
        let child = self.launcher.launch(&command).map_err(RunError::Launch)?;
        let mut group = ProcessGroup::new(child);
        let stdout = group.child.stdout.take().ok_or(RunError::MissingPipe {
            stream: StreamKind::Stdout.as_str(),
        })?;
        let stderr = group.child.stderr.take().ok_or(RunError::MissingPipe {
            stream: StreamKind::Stderr.as_str(),
        })?;

        let out_pump = StreamPump::new(
            StreamKind::Stdout.as_str(),
            vec![&mut out_logger as &mut dyn OutputReader, &mut *algorithm],
        );
        let err_pump = StreamPump::new(
            StreamKind::Stderr.as_str(),
            vec![&mut err_logger as &mut dyn OutputReader, &mut errors],
        );

        // The pumps and their borrows of the collector end with this block.
        let waited = {
            let mut wait = pin!(async {
                let exited = wait_with_limit(&mut group.child, self.timeout).await;
                let elapsed = start.elapsed();
                group.terminate().await;
                exited.map(|exited| (exited, elapsed))
            });
            let mut pumps = pin!(async {
                tokio::join!(out_pump.drain(stdout), err_pump.drain(stderr))
            });

            // Once the group is dead the pipes can only be held open by a
            // process that left it, so draining gets a bounded grace period.
            let (waited, drained) = tokio::select! {
                waited = &mut wait => (waited, timeout(DRAIN_GRACE, &mut pumps).await.ok()),
                drained = &mut pumps => ((&mut wait).await, Some(drained)),
            };
            match drained {
                Some((out_lines, err_lines)) => {
                    tracing::debug!(out_lines, err_lines, "Streams drained")
                }
                None => tracing::warn!(
                    grace = ?DRAIN_GRACE,
                    "Output still open after the process was killed, abandoning it"
                ),
            }
            waited
        };

        let (terminated_in_time, elapsed) = waited.map_err(RunError::Wait)?;
        if !terminated_in_time {
            tracing::warn!(timeout = ?self.timeout(), "Process killed after timeout");
        }
        if let Some(first) = errors.lines().first() {
            tracing::debug!(lines = errors.lines().len(), first = %first, "Process wrote to stderr");
        }

        Ok(Measurement {
            terminated_in_time,
            no_error: errors.is_empty(),
            elapsed,
        })
    }
}

async fn wait_with_limit(child: &mut Child, limit: Option<Duration>) -> std::io::Result<bool> {
    let status = match limit {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => return Ok(false),
        },
        None => child.wait().await?,
    };
    tracing::debug!(%status, "Process exited");
    Ok(true)
}

/// A launched child together with the process group it leads.
///
/// Dropping it kills the whole group, so no process started for a run
/// outlives it.
struct ProcessGroup {
    child: Child,
    leader: Option<Pid>,
}

impl ProcessGroup {
    fn new(child: Child) -> Self {
        // The id is gone once the child is reaped, the group id is not.
        let leader = child
            .id()
            .and_then(|id| i32::try_from(id).ok())
            .map(Pid::from_raw);
        Self { child, leader }
    }

    fn kill_group(&self) {
        let Some(leader) = self.leader else {
            return;
        };
        match killpg(leader, Signal::SIGKILL) {
            Ok(()) => tracing::trace!(pgid = leader.as_raw(), "Process group killed"),
            Err(Errno::ESRCH) => tracing::trace!(pgid = leader.as_raw(), "Process group already gone"),
            Err(err) => tracing::warn!(pgid = leader.as_raw(), "Failed to kill process group: {}", err),
        }
    }

    /// Forcibly kills the group and reaps the child. Killing processes that
    /// already exited is a no-op.
    async fn terminate(&mut self) {
        self.kill_group();
        match self.child.start_kill() {
            Ok(()) => {
                if let Err(err) = self.child.wait().await {
                    tracing::warn!("Failed to reap killed process: {}", err);
                }
            }
            Err(err) => tracing::trace!("Nothing to kill: {}", err),
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill_group();
        let _ = self.child.start_kill();
    }
}
