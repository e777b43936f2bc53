use std::{fs::File, io, path::Path, sync::Mutex};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

use crate::constants::CONSOLE_LOG;

/// Keeps the benchmark logger installed on the current thread. Dropping it
/// restores the previous logger.
#[must_use]
pub struct LogGuard {
    _guard: DefaultGuard,
}

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs a logger that writes to the console and to `console_log.txt`
/// in `log_dir`. `RUST_LOG` takes precedence over `verbosity`.
pub fn install(log_dir: &Path, verbosity: u8) -> io::Result<LogGuard> {
    let file = File::create(log_dir.join(CONSOLE_LOG))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(verbosity >= 2))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        );

    Ok(LogGuard {
        _guard: tracing::subscriber::set_default(subscriber),
    })
}
