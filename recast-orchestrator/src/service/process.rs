//! External process execution
//!
//! Runs the test runner and the report merger as child processes. Output is
//! streamed line by line into the log while the process runs; stdout can be
//! captured instead when the caller needs it.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::config::CommandSpec;

/// Exit state and captured output of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
    /// Captured stdout; empty unless capture was requested
    pub stdout: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A command line ready to run
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    capture_stdout: bool,
}

impl ExternalCommand {
    pub fn new(spec: &CommandSpec) -> Self {
        Self {
            program: spec.program.clone(),
            args: spec.args.clone(),
            envs: Vec::new(),
            capture_stdout: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Keep stdout for the caller instead of logging it
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// Run to completion
    ///
    /// # Arguments
    /// * `timeout` - Kill the process once this elapses; `None` waits forever
    ///
    /// # Returns
    /// The exit state; a non-zero exit is not an error here. Spawn failures,
    /// wait failures and timeouts are.
    pub async fn run(self, timeout: Option<Duration>) -> Result<ProcessOutput> {
        let command_line = self.to_string();
        tracing::debug!("Running: {}", command_line);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group so a timeout can reach the runner's descendants
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", command_line))?;

        let stdout = child.stdout.take().context("Failed to capture stdout")?;
        let stderr = child.stderr.take().context("Failed to capture stderr")?;

        let label = self.program.clone();
        let stdout_task = if self.capture_stdout {
            tokio::spawn(read_all(stdout))
        } else {
            tokio::spawn(log_lines(stdout, label.clone(), false))
        };
        let stderr_task = tokio::spawn(log_lines(stderr, label, true));

        let status = match timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status,
                    Err(_) => {
                        kill_process_group(&child, &command_line);
                        if let Err(e) = child.kill().await {
                            tracing::warn!("Failed to kill '{}': {}", command_line, e);
                        }
                        anyhow::bail!("'{}' timed out after {:?}", command_line, limit);
                    }
                }
            }
            None => child.wait().await,
        }
        .with_context(|| format!("Failed to wait for '{}'", command_line))?;

        let stdout = stdout_task.await.unwrap_or_default();
        if let Err(e) = stderr_task.await {
            tracing::warn!("stderr reader for '{}' failed: {}", command_line, e);
        }

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout,
        })
    }
}

impl std::fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// SIGKILL every process in the child's group
#[cfg(unix)]
fn kill_process_group(child: &Child, command_line: &str) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let Ok(pid) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        tracing::warn!("Failed to kill process group of '{}': {}", command_line, e);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child, _command_line: &str) {}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut buffer = String::new();
    if let Err(e) = reader.read_to_string(&mut buffer).await {
        tracing::warn!("Failed to read process output: {}", e);
    }
    buffer
}

/// Log every non-blank line; always yields an empty capture
async fn log_lines<R: AsyncRead + Unpin>(reader: R, label: String, is_stderr: bool) -> String {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        if is_stderr {
            tracing::warn!("[{}] {}", label, line);
        } else {
            tracing::info!("[{}] {}", label, line);
        }
    }
    String::new()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ExternalCommand {
        ExternalCommand::new(&CommandSpec::new("sh", ["-c", script]))
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let output = sh("echo hello; echo world").capture_stdout().run(None).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "hello\nworld\n");
    }

    #[tokio::test]
    async fn test_streamed_output_is_not_captured() {
        let output = sh("echo hello").run(None).await.unwrap();
        assert!(output.success());
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_reported() {
        let output = sh("echo oops >&2; exit 3").run(None).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_environment_and_args_are_passed() {
        let output = ExternalCommand::new(&CommandSpec::new("sh", ["-c", "echo \"$TEST_RUN_ID $0\""]))
            .arg("spec.cy.js")
            .env("TEST_RUN_ID", "run-5")
            .capture_stdout()
            .run(None)
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "run-5 spec.cy.js");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let started = std::time::Instant::now();
        let err = sh("sleep 5")
            .run(Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_timeout_kills_background_descendants() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());

        let err = sh(&script)
            .run(Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out after 100ms"));

        tokio::time::sleep(Duration::from_millis(1800)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let err = ExternalCommand::new(&CommandSpec::new("recast-no-such-program", Vec::<String>::new()))
            .run(None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"));
    }
}
