//! Subprocess execution for ecosystem tools.
//!
//! Every tool invocation goes through a [`ToolCommand`] handed to a
//! [`CommandRunner`]. The production runner, [`SystemRunner`], resolves the
//! executable on `PATH`, spawns it with `tokio::process`, and maps the
//! outcome onto [`ToolError`]. Tests substitute a scripted runner.
//!
//! ```rust,no_run
//! use lockforge::job::command::{CommandRunner, SystemRunner, ToolCommand};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let output = SystemRunner
//!     .run(&ToolCommand::new("go").args(["mod", "graph"]).current_dir("/path/to/module"))
//!     .await?;
//! println!("{}", output.stdout);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Builder for a single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable name or path
    program: String,

    /// Arguments passed to the program
    args: Vec<String>,

    /// Working directory for the process (defaults to the current directory)
    current_dir: Option<PathBuf>,

    /// Extra environment variables for the process
    env_vars: Vec<(String, String)>,

    /// Identifier included in log lines, usually the manifest path
    context: Option<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            context: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set a context for logging (e.g., the manifest being resolved)
    ///
    /// Concurrent jobs interleave their log lines; the context tells them apart.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// The command line as it is reported to the user.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn log_prefix(&self) -> String {
        self.context.as_ref().map(|ctx| format!("({ctx}) ")).unwrap_or_default()
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Ways a tool invocation can fail.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable could not be located
    #[error("executable file not found in $PATH: {program}")]
    NotFound {
        /// Program that was looked up
        program: String,
    },

    /// The executable exists but may not be executed
    #[error("permission denied when executing {program}")]
    PermissionDenied {
        /// Program that could not be executed
        program: String,
    },

    /// The process could not be started for another reason
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that could not be started
        program: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The process ran and exited unsuccessfully
    #[error("{program} exited with {}", exit_label(.code))]
    Failed {
        /// Program that failed
        program: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "a signal".to_string(),
    }
}

impl ToolError {
    /// Create a failed-exit error with the given stderr.
    pub fn failed(program: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::Failed {
            program: program.into(),
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Text the classification rules are matched against.
    ///
    /// Tools disagree on which stream carries their diagnostics, so both are
    /// included, stderr first.
    pub fn output_text(&self) -> String {
        match self {
            Self::Failed {
                stdout,
                stderr,
                ..
            } => match (stderr.trim().is_empty(), stdout.trim().is_empty()) {
                (false, false) => format!("{}\n{}", stderr.trim_end(), stdout.trim_end()),
                (false, true) => stderr.trim_end().to_string(),
                (true, false) => stdout.trim_end().to_string(),
                (true, true) => self.to_string(),
            },
            _ => self.to_string(),
        }
    }

    pub fn program(&self) -> &str {
        match self {
            Self::NotFound {
                program,
            }
            | Self::PermissionDenied {
                program,
            }
            | Self::Spawn {
                program,
                ..
            }
            | Self::Failed {
                program,
                ..
            } => program,
        }
    }
}

/// The seam every subprocess goes through.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute the command to completion and capture its output.
    async fn run(&self, command: &ToolCommand) -> Result<CommandOutput, ToolError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn locate(program: &str, cwd: Option<&Path>) -> Result<PathBuf, ToolError> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            // Explicit path: relative ones resolve against the working directory
            let resolved = match cwd {
                Some(dir) if candidate.is_relative() => dir.join(candidate),
                _ => candidate.to_path_buf(),
            };
            return if resolved.is_file() {
                Ok(resolved)
            } else {
                Err(ToolError::NotFound {
                    program: program.to_string(),
                })
            };
        }

        which::which(program).map_err(|_| ToolError::NotFound {
            program: program.to_string(),
        })
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &ToolCommand) -> Result<CommandOutput, ToolError> {
        let start = std::time::Instant::now();
        let prefix = command.log_prefix();
        let program = command.program().to_string();
        let executable = Self::locate(&program, command.get_current_dir())?;

        tracing::debug!(
            target: "tool",
            "{}Executing command: {} (in {})",
            prefix,
            command.command_line(),
            command.get_current_dir().map_or_else(|| ".".to_string(), |d| d.display().to_string())
        );

        let mut cmd = Command::new(&executable);
        cmd.args(command.get_args());
        if let Some(dir) = command.get_current_dir() {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.env_vars {
            tracing::trace!(target: "tool", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|source| match source.kind() {
            io::ErrorKind::PermissionDenied => ToolError::PermissionDenied {
                program: program.clone(),
            },
            io::ErrorKind::NotFound => ToolError::NotFound {
                program: program.clone(),
            },
            _ => ToolError::Spawn {
                program: program.clone(),
                source,
            },
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "tool::perf", "{}{} took {:.2}s", prefix, program, elapsed.as_secs_f64());
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(target: "tool::perf", "{}{} took {}ms", prefix, program, elapsed.as_millis());
        }

        if !output.status.success() {
            tracing::debug!(
                target: "tool",
                "{}Command failed with exit code: {:?}",
                prefix,
                output.status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "tool", "{}Error: {}", prefix, stderr.trim());
            }
            return Err(ToolError::Failed {
                program,
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        if !stdout.is_empty() {
            tracing::trace!(target: "tool", "{}{}", prefix, stdout.trim());
        }

        Ok(CommandOutput {
            stdout,
            stderr,
        })
    }
}
