use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::core::traits::launcher::Launcher;

/// Spawns commands directly on the host.
#[derive(Clone, Debug, Default)]
pub struct NativeLauncher;

impl Launcher for NativeLauncher {
    fn launch(&self, command: &[String]) -> std::io::Result<Child> {
        let Some((program, args)) = command.split_first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "command is empty",
            ));
        };

        let mut cmd = Command::new(program);
        // Own group, so a timeout also reaches whatever the process started.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    fn command(elements: &[&str]) -> Vec<String> {
        elements.iter().map(|e| e.to_string()).collect()
    }

    #[tokio::test]
    async fn test_launch_pipes_streams_separately() {
        let mut child = NativeLauncher
            .launch(&command(&["sh", "-c", "echo out; echo err >&2"]))
            .expect("Failed to launch sh");

        let mut stdout = String::new();
        let mut stderr = String::new();
        child
            .stdout
            .take()
            .unwrap()
            .read_to_string(&mut stdout)
            .await
            .unwrap();
        child
            .stderr
            .take()
            .unwrap()
            .read_to_string(&mut stderr)
            .await
            .unwrap();
        let status = child.wait().await.unwrap();

        assert!(status.success());
        assert_eq!(stdout, "out\n");
        assert_eq!(stderr, "err\n");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_launch_leads_own_process_group() {
        // field 5 of /proc/<pid>/stat is the process group id
        let mut child = NativeLauncher
            .launch(&command(&["sh", "-c", "cut -d' ' -f5 /proc/$$/stat"]))
            .expect("Failed to launch sh");
        let pid = child.id().unwrap();

        let mut stdout = String::new();
        child
            .stdout
            .take()
            .unwrap()
            .read_to_string(&mut stdout)
            .await
            .unwrap();
        child.wait().await.unwrap();

        assert_eq!(stdout.trim(), pid.to_string());
    }

    #[tokio::test]
    async fn test_launch_empty_command() {
        let result = NativeLauncher.launch(&[]);

        assert!(matches!(
            result,
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput
        ));
    }

    #[tokio::test]
    async fn test_launch_missing_program() {
        let result = NativeLauncher.launch(&command(&["/aboba/does-not-exist"]));

        assert!(result.is_err());
    }
}
