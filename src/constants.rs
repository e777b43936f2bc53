use std::time::Duration;

/// Sentinel written to the `Time` column when a run was never measured.
pub const INVALID_TIME_MS: i64 = -1;

pub const CSV_DELIMITER: u8 = b';';
pub const DATA_CSV: &str = "data.csv";
pub const MODELS_CSV: &str = "models.csv";
pub const ALGORITHMS_CSV: &str = "algorithms.csv";

pub const CURRENT_OUTPUT_MARKER: &str = ".current";
pub const PATHS_CONFIG: &str = "paths";
pub const CONFIG_EXTENSION: &str = "toml";
pub const MODELS_LIST: &str = "models.txt";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_RESOURCES_DIR: &str = "resources";
pub const DEFAULT_MODELS_DIR: &str = "models";

pub const MODEL_FILE_STEM: &str = "model";
pub const MODEL_FILE: &str = "model.xml";

pub const CONSOLE_LOG: &str = "console_log.txt";

/// How long the output pipes may stay open once the process group is dead.
pub const DRAIN_GRACE: Duration = Duration::from_secs(1);
