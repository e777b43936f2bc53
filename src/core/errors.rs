use std::path::PathBuf;

/// Failure raised by an algorithm hook or by an output reader.
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to build command: {msg}")]
    Command { msg: String },
    #[error("Failed to parse output line {line:?}: {msg}")]
    Parse { line: String, msg: String },
    #[error("No result line starting with {prefix:?} was printed")]
    MissingResult { prefix: String },
}

/// Failure inside a single process run. Never leaves `ProcessRunner::run`,
/// it is logged and folded into the run record instead.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Pre-processing failed: {0}")]
    PreProcess(#[source] AlgorithmError),
    #[error("Command is empty")]
    EmptyCommand,
    #[error("Failed to launch process: {0}")]
    Launch(#[source] std::io::Error),
    #[error("Failed to get process {stream}")]
    MissingPipe { stream: &'static str },
    #[error("Failed to wait for process exit: {0}")]
    Wait(#[source] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed config file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to prepare directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not found: {name}")]
    NotFound { name: String },
    #[error("I/O error while looking up model: {0}")]
    Io(#[from] std::io::Error),
    #[error("Broken model archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write CSV row: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush CSV file: {0}")]
    Flush(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),
    #[error("Failed to set up logging: {0}")]
    Logging(#[source] std::io::Error),
}
