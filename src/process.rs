// External process execution

use crate::error::{PiwatchError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio_stream::wrappers::SplitStream;
use tokio_stream::StreamExt;

/// A non-interactive command to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Short name used to tag echoed output
    pub label: String,
    /// Every output line is appended here while the command runs
    pub log_file: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        let program = program.into();
        Self {
            label: program
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            program,
            args: args.iter().map(|arg| arg.to_string()).collect(),
            log_file: None,
        }
    }

    /// Run `script` through `sh -c`
    pub fn shell(script: &str) -> Self {
        Self::new("sh", &["-c", script])
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    /// Human-readable command line for logs and errors
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and merged stdout/stderr of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Capability to run an external command to completion.
///
/// `Err` means the command could not be launched or its output could not be
/// read; a non-zero exit is still `Ok`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands on the host with tokio's process support
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let process_error = |message: String| PiwatchError::Process {
            command: command.display(),
            message,
        };

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| process_error(format!("failed to spawn: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| process_error("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| process_error("failed to capture stderr".to_string()))?;

        let mut log = match &command.log_file {
            Some(path) => Some(
                tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|e| process_error(format!("failed to open {}: {}", path.display(), e)))?,
            ),
            None => None,
        };

        let mut lines = SplitStream::new(BufReader::new(stdout).split(b'\n'))
            .merge(SplitStream::new(BufReader::new(stderr).split(b'\n')));
        let mut collected = Vec::new();
        let mut read_error = None;

        while let Some(chunk) = lines.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!("[{}] failed to read output: {}", command.label, e);
                    let _ = child.start_kill();
                    read_error = Some(e);
                    break;
                }
            };

            // Output is not guaranteed to be UTF-8
            let line = String::from_utf8_lossy(&chunk);
            let line = line.trim_end_matches('\r');
            tracing::info!("[{}] {}", command.label, line);
            if let Some(file) = log.as_mut() {
                if let Err(e) = file.write_all(format!("{}\n", line).as_bytes()).await {
                    tracing::warn!("[{}] log artifact write failed, no longer logging: {}", command.label, e);
                    log = None;
                }
            }
            collected.push(line.trim().to_string());
        }

        if let Some(file) = log.as_mut() {
            if let Err(e) = file.flush().await {
                tracing::warn!("[{}] log artifact flush failed: {}", command.label, e);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| process_error(format!("failed to wait: {}", e)))?;

        if let Some(e) = read_error {
            return Err(process_error(format!("failed to read output: {}", e)).into());
        }

        Ok(CommandOutput {
            exit_code: status.code(),
            output: collected.join("\n"),
        })
    }
}
