use itertools::Itertools;

use crate::{
    core::{
        domain::{RunContext, SystemEntry},
        errors::{AlgorithmError, BenchmarkError, ModelError},
        pipeline::benchmark::BenchmarkSuite,
        traits::algorithm::Algorithm,
    },
    stubs::algorithm::AlgorithmStub,
};

/// Suite whose model is the system name and whose algorithms are fixed
/// command lines.
#[derive(Debug, Default)]
pub struct SuiteStub {
    algorithms: Vec<(String, Vec<String>, Option<u32>)>,
    failing_model: Option<String>,
    failing_algorithms: Option<String>,
    failing_adapt_model: Option<u32>,
    failing_adapt_algorithm: Option<(String, u32)>,
}

impl SuiteStub {
    pub fn new(algorithms: Vec<(&str, Vec<&str>, Option<u32>)>) -> Self {
        Self {
            algorithms: algorithms
                .into_iter()
                .map(|(name, command, iterations)| {
                    (
                        name.to_string(),
                        command.into_iter().map(str::to_string).collect(),
                        iterations,
                    )
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing_model(mut self, system: &str) -> Self {
        self.failing_model = Some(system.to_string());
        self
    }

    pub fn failing_algorithms(mut self, system: &str) -> Self {
        self.failing_algorithms = Some(system.to_string());
        self
    }

    pub fn failing_adapt_model(mut self, system_iteration: u32) -> Self {
        self.failing_adapt_model = Some(system_iteration);
        self
    }

    /// Fails adapting `algorithm` on its `algorithm_iteration`-th iteration.
    pub fn failing_adapt_algorithm(mut self, algorithm: &str, algorithm_iteration: u32) -> Self {
        self.failing_adapt_algorithm = Some((algorithm.to_string(), algorithm_iteration));
        self
    }
}

#[async_trait::async_trait]
impl BenchmarkSuite for SuiteStub {
    type Algorithm = AlgorithmStub;
    type Model = String;

    async fn prepare_algorithms(
        &mut self,
        system: &SystemEntry,
    ) -> Result<Vec<Self::Algorithm>, BenchmarkError> {
        if self.failing_algorithms.as_deref() == Some(system.name.as_str()) {
            return Err(AlgorithmError::Command {
                msg: "stub has no algorithms for this system".to_string(),
            }
            .into());
        }
        Ok(self
            .algorithms
            .iter()
            .map(|(name, command, iterations)| {
                let algorithm = AlgorithmStub::new(name, command.iter().map(String::as_str).collect());
                match iterations {
                    Some(iterations) => algorithm.with_iterations(*iterations),
                    None => algorithm,
                }
            })
            .collect())
    }

    async fn prepare_model(&mut self, system: &SystemEntry) -> Result<Self::Model, BenchmarkError> {
        if self.failing_model.as_deref() == Some(system.name.as_str()) {
            return Err(ModelError::NotFound {
                name: system.name.clone(),
            }
            .into());
        }
        Ok(system.name.clone())
    }

    async fn adapt_model(
        &mut self,
        model: &Self::Model,
        system_iteration: u32,
    ) -> Result<Self::Model, BenchmarkError> {
        if self.failing_adapt_model == Some(system_iteration) {
            return Err(ModelError::NotFound {
                name: format!("{model}#{system_iteration}"),
            }
            .into());
        }
        Ok(model.clone())
    }

    async fn adapt_algorithm(
        &mut self,
        algorithm: &mut Self::Algorithm,
        _model: &Self::Model,
        run: &RunContext,
    ) -> Result<(), BenchmarkError> {
        if let Some((name, iteration)) = &self.failing_adapt_algorithm
            && algorithm.name() == name
            && run.algorithm_iteration == *iteration
        {
            return Err(AlgorithmError::Command {
                msg: format!("stub refuses iteration {iteration}"),
            }
            .into());
        }
        algorithm.stdout.clear();
        Ok(())
    }

    fn model_header(&self) -> Vec<String> {
        vec!["Length".to_string()]
    }

    fn model_columns(&self, model: &Self::Model) -> Vec<String> {
        vec![model.len().to_string()]
    }

    fn render_result(&self, payload: &Vec<String>) -> String {
        payload.iter().join("|")
    }
}
