use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    config::AlgorithmConfig,
    core::{
        errors::AlgorithmError,
        traits::{
            algorithm::{Algorithm, CommandLine},
            reader::OutputReader,
        },
    },
};

const MODEL_PLACEHOLDER: &str = "{model}";
const TEMP_PLACEHOLDER: &str = "{temp}";
const SEED_PLACEHOLDER: &str = "{seed}";
const ITERATION_PLACEHOLDER: &str = "{iteration}";

/// External program configured by an `[[algorithms]]` table.
///
/// The result is the text after `result_prefix` on the last stdout line that
/// starts with it.
#[derive(Clone, Debug)]
pub struct CommandAlgorithm {
    config: AlgorithmConfig,
    command: CommandLine,
    iterations: Option<u32>,
    scratch_root: PathBuf,
    scratch: Option<PathBuf>,
    model: Option<PathBuf>,
    seed: u64,
    iteration: u32,
    result: Option<String>,
}

impl CommandAlgorithm {
    pub fn new(config: AlgorithmConfig, scratch_root: PathBuf) -> Self {
        Self {
            iterations: config.iterations,
            config,
            command: CommandLine::default(),
            scratch_root,
            scratch: None,
            model: None,
            seed: 0,
            iteration: 0,
            result: None,
        }
    }

    /// Sets what the placeholders of the next command expand to.
    pub fn prepare_run(&mut self, model: &Path, seed: u64, iteration: u32) {
        self.model = Some(model.to_path_buf());
        self.seed = seed;
        self.iteration = iteration;
    }

    fn templates(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.config.program).chain(self.config.args.iter())
    }

    fn uses(&self, placeholder: &str) -> bool {
        self.templates().any(|template| template.contains(placeholder))
    }

    fn create_scratch(&mut self) -> Result<PathBuf, AlgorithmError> {
        if let Some(scratch) = &self.scratch {
            return Ok(scratch.clone());
        }
        let scratch = self
            .scratch_root
            .join(format!("{}-{}", self.config.name, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&scratch)?;
        self.scratch = Some(scratch.clone());
        Ok(scratch)
    }
}

impl OutputReader for CommandAlgorithm {
    fn read_output(&mut self, line: &str) -> Result<(), AlgorithmError> {
        if let Some(prefix) = &self.config.result_prefix
            && let Some(value) = line.strip_prefix(prefix.as_str())
        {
            self.result = Some(value.trim().to_string());
        }
        Ok(())
    }
}

impl Algorithm for CommandAlgorithm {
    type Output = String;

    fn name(&self) -> &str {
        &self.config.name
    }

    fn parameter_settings(&self) -> String {
        self.config.settings.clone()
    }

    fn iterations(&self) -> Option<u32> {
        self.iterations
    }

    fn set_iterations(&mut self, iterations: u32) {
        self.iterations = Some(iterations);
    }

    fn pre_process(&mut self) -> Result<(), AlgorithmError> {
        self.command.clear();
        self.result = None;

        let model = match &self.model {
            Some(model) => model.display().to_string(),
            None if self.uses(MODEL_PLACEHOLDER) => {
                return Err(AlgorithmError::Command {
                    msg: format!("no model set for {}", self.config.name),
                });
            }
            None => String::new(),
        };
        let temp = if self.uses(TEMP_PLACEHOLDER) {
            self.create_scratch()?.display().to_string()
        } else {
            String::new()
        };
        let seed = self.seed.to_string();
        let iteration = self.iteration.to_string();

        let elements: Vec<String> = self
            .templates()
            .map(|template| {
                template
                    .replace(MODEL_PLACEHOLDER, &model)
                    .replace(TEMP_PLACEHOLDER, &temp)
                    .replace(SEED_PLACEHOLDER, &seed)
                    .replace(ITERATION_PLACEHOLDER, &iteration)
            })
            .collect();
        self.command.extend(elements);
        Ok(())
    }

    fn command_elements(&self) -> &[String] {
        self.command.as_slice()
    }

    fn parse_results(&mut self) -> Result<Self::Output, AlgorithmError> {
        match &self.config.result_prefix {
            None => Ok(String::new()),
            Some(prefix) => self.result.take().ok_or_else(|| AlgorithmError::MissingResult {
                prefix: prefix.clone(),
            }),
        }
    }

    fn post_process(&mut self) -> Result<(), AlgorithmError> {
        let Some(scratch) = self.scratch.take() else {
            return Ok(());
        };
        match std::fs::remove_dir_all(&scratch) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
