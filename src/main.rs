use std::panic;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::BenchmarkConfig;
use crate::core::errors::BenchmarkError;
use crate::core::pipeline::benchmark::{BenchmarkDriver, BenchmarkSuite, BenchmarkSummary};
use crate::core::pipeline::running::ProcessRunner;
use crate::external::suite::CommandSuite;
use crate::models::ModelLocator;
use crate::native::launcher::NativeLauncher;
use crate::sink::CsvSink;

mod cli;
mod config;
mod constants;
mod core;
mod external;
mod logging;
mod models;
mod native;
mod sink;

#[cfg(test)]
mod integration_test;
#[cfg(test)]
mod stubs;

// The benchmark logger is installed per thread, so everything stays on
// the main thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    set_panic_hook();

    match Cli::parse().command {
        Command::Run { config, name } => {
            let summary = run_benchmark(&config, name.as_deref()).await?;
            tracing::info!(
                runs = summary.runs,
                timeouts = summary.timeouts,
                errors = summary.errors,
                skipped_systems = summary.skipped_systems,
                "Benchmark finished"
            );
        }
        Command::Reset { config, name } => reset(&config, name.as_deref()).await?,
    }

    Ok(())
}

/// Loads the configuration, prepares the output directory and runs every
/// configured program on every listed model.
async fn run_benchmark(
    config_dir: &Path,
    name: Option<&str>,
) -> Result<BenchmarkSummary, BenchmarkError> {
    let config = BenchmarkConfig::load(config_dir, name).await?;
    let output = config.prepare_output().await?;
    let _log = logging::install(&output.log, config.verbosity).map_err(BenchmarkError::Logging)?;
    tracing::info!(
        output = %output.root.display(),
        seed = config.seed,
        timeout = ?config.timeout,
        "Benchmark configured"
    );

    let systems = match models::read_system_list(&config.models_list()).await {
        Ok(systems) => systems,
        Err(err) => {
            tracing::error!("No models specified: {}", err);
            return Err(err.into());
        }
    };

    let suite = CommandSuite::new(
        config.algorithms.clone(),
        ModelLocator::new(config.models.clone(), output.temp.clone()),
        output.temp.clone(),
        config.seed,
    );
    let runner = ProcessRunner::new(Arc::new(NativeLauncher))
        .with_timeout(config.timeout)
        .with_verbose(config.verbose());
    let sink = CsvSink::open(&output.data, config.append, &suite.model_header())?;

    let mut driver = BenchmarkDriver::new(
        suite,
        runner,
        sink,
        config.system_iterations,
        config.algorithm_iterations,
    );
    driver.run(&systems).await
}

async fn reset(config_dir: &Path, name: Option<&str>) -> Result<(), BenchmarkError> {
    let config = BenchmarkConfig::load(config_dir, name).await?;
    if config::reset_output(&config.output_root).await? {
        tracing::info!("Output reset in {}", config.output_root.display());
    } else {
        tracing::info!("No current output in {}", config.output_root.display());
    }
    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
