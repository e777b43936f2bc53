use crate::{
    core::{
        domain::{RunContext, RunRecord, SystemEntry},
        errors::{BenchmarkError, SinkError},
        pipeline::running::ProcessRunner,
        traits::algorithm::Algorithm,
    },
    sink::{CsvSink, DataRow},
};

/// Supplies algorithms and models to the benchmark loop.
#[async_trait::async_trait]
pub trait BenchmarkSuite: Send {
    type Algorithm: Algorithm;
    type Model: Send + Sync;

    async fn prepare_algorithms(
        &mut self,
        system: &SystemEntry,
    ) -> Result<Vec<Self::Algorithm>, BenchmarkError>;

    async fn prepare_model(&mut self, system: &SystemEntry) -> Result<Self::Model, BenchmarkError>;

    /// Derives the model used in one system iteration.
    async fn adapt_model(
        &mut self,
        model: &Self::Model,
        system_iteration: u32,
    ) -> Result<Self::Model, BenchmarkError>;

    async fn adapt_algorithm(
        &mut self,
        algorithm: &mut Self::Algorithm,
        model: &Self::Model,
        run: &RunContext,
    ) -> Result<(), BenchmarkError>;

    /// Extra `models.csv` columns after `ModelID` and `Name`.
    fn model_header(&self) -> Vec<String> {
        Vec::new()
    }

    fn model_columns(&self, _model: &Self::Model) -> Vec<String> {
        Vec::new()
    }

    /// Renders a parsed result for the `Result` column of `data.csv`.
    fn render_result(&self, payload: &<Self::Algorithm as Algorithm>::Output) -> String;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BenchmarkSummary {
    pub runs: usize,
    pub timeouts: usize,
    pub errors: usize,
    pub skipped_systems: usize,
}

impl BenchmarkSummary {
    fn record<R>(&mut self, record: &RunRecord<R>) {
        self.runs += 1;
        if !record.terminated_in_time {
            self.timeouts += 1;
        }
        if !record.no_error {
            self.errors += 1;
        }
    }
}

/// Runs every algorithm of every system, one process at a time, and writes
/// one CSV row per run.
pub struct BenchmarkDriver<S> {
    suite: S,
    runner: ProcessRunner,
    sink: CsvSink,
    system_iterations: u32,
    algorithm_iterations: u32,
}

impl<S: BenchmarkSuite> BenchmarkDriver<S> {
    pub fn new(
        suite: S,
        runner: ProcessRunner,
        sink: CsvSink,
        system_iterations: u32,
        algorithm_iterations: u32,
    ) -> Self {
        Self {
            suite,
            runner,
            sink,
            system_iterations,
            algorithm_iterations,
        }
    }

    /// Only sink failures abort the benchmark; suite failures skip the
    /// affected system or algorithm.
    pub async fn run(&mut self, systems: &[SystemEntry]) -> Result<BenchmarkSummary, BenchmarkError> {
        let mut summary = BenchmarkSummary::default();
        if self.system_iterations == 0 {
            tracing::info!("Nothing to do");
            return Ok(summary);
        }

        tracing::info!(systems = systems.len(), "Start");
        for (system_index, system) in systems.iter().enumerate() {
            let completed = self
                .run_system(system_index, systems.len(), system, &mut summary)
                .await?;
            if !completed {
                summary.skipped_systems += 1;
            }
        }
        tracing::info!(?summary, "Finished");

        Ok(summary)
    }

    #[tracing::instrument(skip_all, fields(system = %system.name))]
    async fn run_system(
        &mut self,
        system_index: usize,
        system_count: usize,
        system: &SystemEntry,
        summary: &mut BenchmarkSummary,
    ) -> Result<bool, SinkError> {
        let mut algorithms = match self.suite.prepare_algorithms(system).await {
            Ok(algorithms) => algorithms,
            Err(err) => {
                tracing::error!("Failed to prepare algorithms: {}", err);
                return Ok(false);
            }
        };
        for (algorithm_index, algorithm) in algorithms.iter_mut().enumerate() {
            if algorithm.iterations().is_none() {
                algorithm.set_iterations(self.algorithm_iterations);
            }
            self.sink.write_algorithm(
                system.id,
                algorithm_index,
                algorithm.name(),
                &algorithm.parameter_settings(),
            )?;
        }

        let model = match self.suite.prepare_model(system).await {
            Ok(model) => model,
            Err(err) => {
                tracing::error!("Failed to prepare model: {}", err);
                return Ok(false);
            }
        };
        let columns = self.suite.model_columns(&model);
        self.sink.write_model(system.id, &system.name, &columns)?;

        let algorithm_count = algorithms.len();
        for system_iteration in 1..=self.system_iterations {
            let adapted = match self.suite.adapt_model(&model, system_iteration).await {
                Ok(adapted) => adapted,
                Err(err) => {
                    tracing::error!(system_iteration, "Failed to adapt model: {}", err);
                    return Ok(false);
                }
            };

            for (algorithm_index, algorithm) in algorithms.iter_mut().enumerate() {
                let iterations = algorithm.iterations().unwrap_or(self.algorithm_iterations);
                for algorithm_iteration in 1..=iterations {
                    let run = RunContext {
                        system_index,
                        system_count,
                        system_iteration,
                        system_iterations: self.system_iterations,
                        algorithm_index,
                        algorithm_count,
                        algorithm_iteration,
                        algorithm_iterations: iterations,
                    };
                    if let Err(err) = self.suite.adapt_algorithm(algorithm, &adapted, &run).await {
                        tracing::error!(
                            algorithm = %algorithm.full_name(),
                            "Failed to adapt algorithm: {}",
                            err
                        );
                        break;
                    }

                    tracing::info!("{}", run.progress(&algorithm.full_name()));
                    let record = self.runner.run(algorithm).await;
                    summary.record(&record);
                    self.sink.write_data(&DataRow {
                        model_id: system.id,
                        algorithm_id: algorithm_index,
                        system_iteration,
                        algorithm_iteration,
                        in_time: record.terminated_in_time,
                        no_error: record.no_error,
                        time: record.time_ms,
                        result: record
                            .payload
                            .as_ref()
                            .map(|payload| self.suite.render_result(payload))
                            .unwrap_or_default(),
                    })?;
                }
            }
        }

        Ok(true)
    }
}
