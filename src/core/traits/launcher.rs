use tokio::process::Child;

/// Starts the subprocess for a command line `[program, args...]`.
///
/// Implementations must pipe stdout and stderr separately.
#[cfg_attr(test, mockall::automock)]
pub trait Launcher: std::fmt::Debug + Send + Sync {
    fn launch(&self, command: &[String]) -> std::io::Result<Child>;
}
