//! Test utilities shared by unit and integration tests.
//!
//! Available under `cfg(test)` and with the `test-utils` feature, which the
//! crate's own dev-dependency enables for the integration suite.
//!
//! - [`MockRunner`] - a scripted [`CommandRunner`] that records every
//!   invocation instead of spawning processes
//! - [`init_test_logging`] - one-time tracing setup honouring `RUST_LOG`

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::ResolveConfig;
use crate::job::{CommandOutput, CommandRunner, ToolCommand, ToolContext, ToolError};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; does nothing if neither is
/// set.
///
/// ```bash
/// RUST_LOG=tool=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

type Handler = Arc<dyn Fn(&ToolCommand) -> Result<CommandOutput, ToolError> + Send + Sync>;

/// Scripted command runner.
///
/// Rules are matched in insertion order against the full command line with a
/// substring test; the first match answers. Commands no rule matches succeed
/// with empty output. Clones share the same rules and invocation log.
///
/// ```rust,ignore
/// let runner = MockRunner::new()
///     .respond("pip list", "Package Version\n------- -------\nidna 3.7\n")
///     .fail("npm install", 1, "npm ERR! code ENOTFOUND");
/// let ctx = runner.context();
/// // ... run a job ...
/// assert_eq!(runner.invocations().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockRunner {
    rules: Arc<Mutex<Vec<(String, Handler)>>>,
    invocations: Arc<Mutex<Vec<ToolCommand>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer matching commands with custom logic (e.g. writing files).
    pub fn handle<F>(self, needle: &str, handler: F) -> Self
    where
        F: Fn(&ToolCommand) -> Result<CommandOutput, ToolError> + Send + Sync + 'static,
    {
        self.rules.lock().unwrap().push((needle.to_string(), Arc::new(handler)));
        self
    }

    /// Succeed with the given stdout.
    pub fn respond(self, needle: &str, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.handle(needle, move |_| Ok(CommandOutput::new(stdout.clone())))
    }

    /// Succeed after writing `file` into the command's working directory, the
    /// way install-type tools leave their lock file behind.
    pub fn writes(self, needle: &str, file: &str, content: &str) -> Self {
        let (file, content) = (file.to_string(), content.to_string());
        self.handle(needle, move |cmd| {
            let dir = cmd.get_current_dir().unwrap_or(Path::new("."));
            std::fs::write(dir.join(&file), &content)
                .map_err(|e| ToolError::failed(cmd.program(), 1, format!("{file}: {e}")))?;
            Ok(CommandOutput::default())
        })
    }

    /// Exit non-zero with the given stderr.
    pub fn fail(self, needle: &str, code: i32, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.handle(needle, move |cmd| Err(ToolError::failed(cmd.program(), code, stderr.clone())))
    }

    /// Pretend the program is not installed.
    pub fn missing(self, program: &str) -> Self {
        self.handle(program, |cmd| {
            Err(ToolError::NotFound {
                program: cmd.program().to_string(),
            })
        })
    }

    /// Pretend the program exists but is not executable.
    pub fn deny(self, program: &str) -> Self {
        self.handle(program, |cmd| {
            Err(ToolError::PermissionDenied {
                program: cmd.program().to_string(),
            })
        })
    }

    /// Command lines seen so far, in order.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().iter().map(ToolCommand::command_line).collect()
    }

    /// Full commands seen so far, in order.
    pub fn commands(&self) -> Vec<ToolCommand> {
        self.invocations.lock().unwrap().clone()
    }

    /// A [`ToolContext`] backed by this runner and the default config.
    pub fn context(&self) -> ToolContext {
        self.context_with(ResolveConfig::default())
    }

    /// A [`ToolContext`] backed by this runner and `config`.
    pub fn context_with(&self, config: ResolveConfig) -> ToolContext {
        ToolContext::new(Arc::new(self.clone()), Arc::new(config))
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &ToolCommand) -> Result<CommandOutput, ToolError> {
        self.invocations.lock().unwrap().push(command.clone());
        let line = command.command_line();
        let handler = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, handler)| Arc::clone(handler));

        match handler {
            Some(handler) => handler(command),
            None => Ok(CommandOutput::default()),
        }
    }
}
