use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "algobench", version, about = "Benchmarks external programs on a list of models")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run the benchmark described by a configuration directory
    Run {
        #[arg(short, long, default_value = "config")]
        config: PathBuf,
        /// Profile read after `paths.toml`
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Forget the current output directory so the next run starts a new one
    Reset {
        #[arg(short, long, default_value = "config")]
        config: PathBuf,
        #[arg(short, long)]
        name: Option<String>,
    },
}
