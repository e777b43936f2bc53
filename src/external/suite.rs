use std::path::PathBuf;

use crate::{
    config::AlgorithmConfig,
    core::{
        domain::{RunContext, SystemEntry},
        errors::BenchmarkError,
        pipeline::benchmark::BenchmarkSuite,
    },
    external::algorithm::CommandAlgorithm,
    models::{ModelFile, ModelLocator},
};

/// Runs the configured programs against model files found by a
/// [`ModelLocator`].
#[derive(Debug)]
pub struct CommandSuite {
    algorithms: Vec<AlgorithmConfig>,
    locator: ModelLocator,
    scratch_root: PathBuf,
    seed: u64,
}

impl CommandSuite {
    pub fn new(algorithms: Vec<AlgorithmConfig>, locator: ModelLocator, scratch_root: PathBuf, seed: u64) -> Self {
        Self {
            algorithms,
            locator,
            scratch_root,
            seed,
        }
    }
}

#[async_trait::async_trait]
impl BenchmarkSuite for CommandSuite {
    type Algorithm = CommandAlgorithm;
    type Model = ModelFile;

    async fn prepare_algorithms(
        &mut self,
        _system: &SystemEntry,
    ) -> Result<Vec<Self::Algorithm>, BenchmarkError> {
        Ok(self
            .algorithms
            .iter()
            .cloned()
            .map(|config| CommandAlgorithm::new(config, self.scratch_root.clone()))
            .collect())
    }

    async fn prepare_model(&mut self, system: &SystemEntry) -> Result<Self::Model, BenchmarkError> {
        Ok(self.locator.locate(&system.name).await?)
    }

    async fn adapt_model(
        &mut self,
        model: &Self::Model,
        _system_iteration: u32,
    ) -> Result<Self::Model, BenchmarkError> {
        Ok(model.clone())
    }

    /// Each system iteration gets its own seed so that randomized programs
    /// vary between iterations but repeat between benchmarks.
    async fn adapt_algorithm(
        &mut self,
        algorithm: &mut Self::Algorithm,
        model: &Self::Model,
        run: &RunContext,
    ) -> Result<(), BenchmarkError> {
        let seed = self.seed.wrapping_add(u64::from(run.system_iteration));
        algorithm.prepare_run(&model.path, seed, run.algorithm_iteration);
        Ok(())
    }

    fn model_header(&self) -> Vec<String> {
        vec!["Path".to_string(), "Bytes".to_string()]
    }

    fn model_columns(&self, model: &Self::Model) -> Vec<String> {
        vec![model.path.display().to_string(), model.bytes.to_string()]
    }

    fn render_result(&self, payload: &String) -> String {
        payload.clone()
    }
}
