use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tokio::fs;

use crate::{
    constants::{
        CONFIG_EXTENSION, CURRENT_OUTPUT_MARKER, DEFAULT_MODELS_DIR, DEFAULT_OUTPUT_DIR,
        DEFAULT_RESOURCES_DIR, MODELS_LIST, PATHS_CONFIG,
    },
    core::errors::ConfigError,
};

/// One `[[algorithms]]` table.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AlgorithmConfig {
    pub name: String,
    #[serde(default)]
    pub settings: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub iterations: Option<u32>,
    pub result_prefix: Option<String>,
}

/// Raw contents of one config file. Every key is optional so that a
/// profile only needs to name what it changes.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    output: Option<PathBuf>,
    resources: Option<PathBuf>,
    models: Option<PathBuf>,
    append: Option<bool>,
    verbosity: Option<u8>,
    timeout_ms: Option<u64>,
    seed: Option<u64>,
    system_iterations: Option<u32>,
    algorithm_iterations: Option<u32>,
    algorithms: Option<Vec<AlgorithmConfig>>,
}

impl ConfigFile {
    fn merge(self, over: ConfigFile) -> ConfigFile {
        ConfigFile {
            output: over.output.or(self.output),
            resources: over.resources.or(self.resources),
            models: over.models.or(self.models),
            append: over.append.or(self.append),
            verbosity: over.verbosity.or(self.verbosity),
            timeout_ms: over.timeout_ms.or(self.timeout_ms),
            seed: over.seed.or(self.seed),
            system_iterations: over.system_iterations.or(self.system_iterations),
            algorithm_iterations: over.algorithm_iterations.or(self.algorithm_iterations),
            algorithms: over.algorithms.or(self.algorithms),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub config_dir: PathBuf,
    pub output_root: PathBuf,
    /// Models root, already resolved under `resources`.
    pub models: PathBuf,
    pub append: bool,
    pub verbosity: u8,
    pub timeout: Option<Duration>,
    pub seed: u64,
    pub system_iterations: u32,
    pub algorithm_iterations: u32,
    pub algorithms: Vec<AlgorithmConfig>,
}

/// Directories of the current output, all created by [`BenchmarkConfig::prepare_output`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub root: PathBuf,
    pub data: PathBuf,
    pub temp: PathBuf,
    pub log: PathBuf,
}

impl BenchmarkConfig {
    /// Reads `paths.toml` and then the `name` profile from `config_dir`.
    /// Keys of the profile win. Missing files are skipped.
    #[tracing::instrument(skip_all, fields(config_dir = %config_dir.display()))]
    pub async fn load(config_dir: &Path, name: Option<&str>) -> Result<Self, ConfigError> {
        let mut file = read_config_file(config_dir, PATHS_CONFIG)
            .await?
            .unwrap_or_default();
        if let Some(name) = name {
            if let Some(profile) = read_config_file(config_dir, name).await? {
                file = file.merge(profile);
            }
        }

        let resources = file
            .resources
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCES_DIR));
        let models = resources.join(file.models.unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR)));

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            output_root: file.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            models,
            append: file.append.unwrap_or(false),
            verbosity: file.verbosity.unwrap_or(0),
            timeout: file.timeout_ms.map(Duration::from_millis),
            seed: file
                .seed
                .unwrap_or_else(|| u64::try_from(now_millis()).unwrap_or_default()),
            system_iterations: file.system_iterations.unwrap_or(1),
            algorithm_iterations: file.algorithm_iterations.unwrap_or(1),
            algorithms: file.algorithms.unwrap_or_default(),
        })
    }

    pub fn verbose(&self) -> bool {
        self.verbosity > 0
    }

    pub fn models_list(&self) -> PathBuf {
        self.config_dir.join(MODELS_LIST)
    }

    /// Resolves the current output directory and creates its layout.
    ///
    /// The directory name comes from the `.current` marker, so consecutive
    /// runs keep writing into the same output until the marker is reset.
    pub async fn prepare_output(&self) -> Result<OutputPaths, ConfigError> {
        create_dir(&self.output_root).await?;

        let marker_path = self.output_root.join(CURRENT_OUTPUT_MARKER);
        let marker = match read_marker(&marker_path).await {
            Some(marker) => marker,
            None => {
                let marker = (i64::MAX - now_millis()).to_string();
                if let Err(err) = fs::write(&marker_path, &marker).await {
                    tracing::error!("Failed to write output marker {}: {}", marker_path.display(), err);
                }
                marker
            }
        };

        let root = self.output_root.join(marker);
        let paths = OutputPaths {
            data: root.join("data"),
            temp: root.join("temp"),
            log: root.join(format!("log-{}", now_millis())),
            root,
        };
        for dir in [&paths.data, &paths.temp, &paths.log] {
            create_dir(dir).await?;
        }
        tracing::debug!(output = %paths.root.display(), "Output prepared");

        Ok(paths)
    }
}

/// Forgets the current output so the next run starts a new directory.
/// Returns whether there was a marker to remove.
pub async fn reset_output(output_root: &Path) -> Result<bool, ConfigError> {
    let marker_path = output_root.join(CURRENT_OUTPUT_MARKER);
    match fs::remove_file(&marker_path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ConfigError::Read {
            path: marker_path,
            source,
        }),
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

async fn read_config_file(config_dir: &Path, name: &str) -> Result<Option<ConfigFile>, ConfigError> {
    let path = config_dir.join(name).with_extension(CONFIG_EXTENSION);
    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::info!("No config file at {}, skipping", path.display());
            return Ok(None);
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    let file = toml::from_str(&content).map_err(|source| ConfigError::Malformed {
        path: path.clone(),
        source,
    })?;
    tracing::info!("Read config file {}", path.display());
    Ok(Some(file))
}

async fn read_marker(path: &Path) -> Option<String> {
    match fs::read_to_string(path).await {
        Ok(content) => content
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            tracing::error!("Failed to read output marker {}: {}", path.display(), err);
            None
        }
    }
}

async fn create_dir(path: &Path) -> Result<(), ConfigError> {
    fs::create_dir_all(path)
        .await
        .map_err(|source| ConfigError::Directory {
            path: path.to_path_buf(),
            source,
        })
}
