use crate::core::{errors::AlgorithmError, traits::reader::OutputReader};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

/// Passes lines through to the log. Stdout lines are logged as info and
/// stderr lines as errors, and only when running verbose.
#[derive(Clone, Debug)]
pub struct LogReader {
    kind: StreamKind,
    verbose: bool,
}

impl LogReader {
    pub fn new(kind: StreamKind, verbose: bool) -> Self {
        Self { kind, verbose }
    }
}

impl OutputReader for LogReader {
    fn read_output(&mut self, line: &str) -> Result<(), AlgorithmError> {
        if !self.verbose {
            return Ok(());
        }
        match self.kind {
            StreamKind::Stdout => tracing::info!(stream = self.kind.as_str(), "{}", line),
            StreamKind::Stderr => tracing::error!(stream = self.kind.as_str(), "{}", line),
        }
        Ok(())
    }
}

/// Keeps every line it receives, verbatim and in order.
#[derive(Clone, Debug, Default)]
pub struct ErrorCollector {
    lines: Vec<String>,
}

impl ErrorCollector {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl OutputReader for ErrorCollector {
    fn read_output(&mut self, line: &str) -> Result<(), AlgorithmError> {
        self.lines.push(line.to_string());
        Ok(())
    }
}
