//! Error handling for lockforge
//!
//! lockforge distinguishes two kinds of failure:
//!
//! 1. **Infrastructure errors** ([`LockforgeError`]) stop a resolve run before
//!    or around scheduling: an unknown ecosystem name, an unreadable config
//!    file, a scheduler task that panicked. They propagate as
//!    [`anyhow::Error`] and are shown to the user through [`ErrorContext`].
//! 2. **Job errors** ([`crate::job::JobError`]) are recorded by a single
//!    manifest's job and never abort the run. They are rendered by
//!    [`crate::resolution::report`].
//!
//! Use [`user_friendly_error`] to turn any infrastructure error into an
//! [`ErrorContext`] with a suggestion.
//!
//! # Examples
//!
//! ```rust,no_run
//! use lockforge::core::{LockforgeError, ErrorContext};
//!
//! let context = ErrorContext::new(LockforgeError::UnknownStrategy {
//!     name: "pnpm".to_string(),
//! })
//! .with_suggestion("Run 'lockforge ecosystems' to list supported package managers");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Infrastructure errors raised by the resolution engine.
///
/// None of these describe a single manifest failing to resolve; those are
/// recorded on the job instead.
#[derive(Error, Debug)]
pub enum LockforgeError {
    /// The strategy factory was handed a package manager it cannot dispatch
    #[error("failed to make strategy from {name}")]
    UnknownStrategy {
        /// Name carried by the batch's package manager
        name: String,
    },

    /// Configuration named an ecosystem that is not registered
    #[error("unknown ecosystem '{name}' in configuration")]
    UnknownEcosystem {
        /// The offending name
        name: String,
    },

    /// A manifest pattern did not compile
    #[error("invalid manifest pattern '{pattern}' for {name}: {reason}")]
    InvalidPattern {
        /// Package manager that owns the pattern
        name: String,
        /// The pattern source
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// An exclusion glob did not compile
    #[error("invalid exclusion glob '{pattern}': {reason}")]
    InvalidExclusion {
        /// The glob source
        pattern: String,
        /// Parser message
        reason: String,
    },

    /// The configuration file could not be read or parsed
    #[error("invalid configuration in {path}: {reason}")]
    ConfigError {
        /// Path of the configuration file
        path: String,
        /// What went wrong
        reason: String,
    },

    /// A scan root given on the command line does not exist
    #[error("path does not exist: {path}")]
    PathNotFound {
        /// The missing path
        path: String,
    },

    /// A job task died without handing its job back
    #[error("scheduler failed while running {file}: {reason}")]
    SchedulerFailure {
        /// Manifest of the job whose task failed
        file: String,
        /// Join error message
        reason: String,
    },

    /// The Gradle init script could not be materialized
    #[error("failed to prepare resource {name}: {reason}")]
    ResourceError {
        /// Resource name
        name: String,
        /// What went wrong
        reason: String,
    },

    /// IO error passthrough
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parse error passthrough
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Anything without a dedicated variant
    #[error("{message}")]
    Other {
        /// The error message
        message: String,
    },
}

/// An error paired with optional details and a suggestion for the user.
///
/// This is what the CLI prints when a resolve run cannot even start or
/// cannot finish scheduling.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: LockforgeError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no details or suggestion.
    #[must_use]
    pub const fn new(error: LockforgeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly format with contextual suggestions.
///
/// Walks the error chain looking for a [`LockforgeError`]; anything else is
/// reported with its full chain as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(lockforge_error) = cause.downcast_ref::<LockforgeError>() {
            let context = create_error_context(lockforge_error);
            // Outer anyhow context is what the user was doing when it failed
            return if error.to_string() == lockforge_error.to_string() {
                context
            } else {
                context.with_details(error.to_string())
            };
        }
    }

    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let context = ErrorContext::new(LockforgeError::Other {
        message: error.to_string(),
    });
    if chain.is_empty() { context } else { context.with_details(chain.join(": ")) }
}

fn create_error_context(error: &LockforgeError) -> ErrorContext {
    let copy = clone_error(error);
    match error {
        LockforgeError::UnknownStrategy {
            ..
        }
        | LockforgeError::UnknownEcosystem {
            ..
        } => ErrorContext::new(copy)
            .with_suggestion("Run 'lockforge ecosystems' to list the supported package managers"),
        LockforgeError::InvalidPattern {
            ..
        }
        | LockforgeError::InvalidExclusion {
            ..
        } => ErrorContext::new(copy).with_suggestion(
            "Check the pattern syntax; manifest patterns are regular expressions, exclusions are globs",
        ),
        LockforgeError::ConfigError {
            path,
            ..
        } => ErrorContext::new(copy)
            .with_suggestion(format!("Fix or remove {path}; every field in it is optional")),
        LockforgeError::PathNotFound {
            ..
        } => ErrorContext::new(copy).with_suggestion("Check the paths passed to 'lockforge resolve'"),
        LockforgeError::SchedulerFailure {
            ..
        } => ErrorContext::new(copy)
            .with_details("A job stopped without reporting its result")
            .with_suggestion("Re-run with --verbose and report the output if the problem persists"),
        LockforgeError::ResourceError {
            ..
        }
        | LockforgeError::IoError(_) => ErrorContext::new(copy)
            .with_suggestion("Check that the temporary directory is writable and has free space"),
        LockforgeError::TomlError(_) => ErrorContext::new(copy)
            .with_suggestion("Check the TOML syntax of your lockforge configuration"),
        LockforgeError::Other {
            ..
        } => ErrorContext::new(copy),
    }
}

// io::Error and toml errors are not Clone; they are rendered into ConfigError
fn clone_error(error: &LockforgeError) -> LockforgeError {
    match error {
        LockforgeError::UnknownStrategy {
            name,
        } => LockforgeError::UnknownStrategy {
            name: name.clone(),
        },
        LockforgeError::UnknownEcosystem {
            name,
        } => LockforgeError::UnknownEcosystem {
            name: name.clone(),
        },
        LockforgeError::InvalidPattern {
            name,
            pattern,
            reason,
        } => LockforgeError::InvalidPattern {
            name: name.clone(),
            pattern: pattern.clone(),
            reason: reason.clone(),
        },
        LockforgeError::InvalidExclusion {
            pattern,
            reason,
        } => LockforgeError::InvalidExclusion {
            pattern: pattern.clone(),
            reason: reason.clone(),
        },
        LockforgeError::ConfigError {
            path,
            reason,
        } => LockforgeError::ConfigError {
            path: path.clone(),
            reason: reason.clone(),
        },
        LockforgeError::PathNotFound {
            path,
        } => LockforgeError::PathNotFound {
            path: path.clone(),
        },
        LockforgeError::SchedulerFailure {
            file,
            reason,
        } => LockforgeError::SchedulerFailure {
            file: file.clone(),
            reason: reason.clone(),
        },
        LockforgeError::ResourceError {
            name,
            reason,
        } => LockforgeError::ResourceError {
            name: name.clone(),
            reason: reason.clone(),
        },
        LockforgeError::IoError(e) => LockforgeError::IoError(std::io::Error::new(e.kind(), e.to_string())),
        LockforgeError::TomlError(e) => LockforgeError::Other {
            message: format!("TOML parsing error: {e}"),
        },
        LockforgeError::Other {
            message,
        } => LockforgeError::Other {
            message: message.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_unknown_strategy_message() {
        let error = LockforgeError::UnknownStrategy {
            name: "pnpm".to_string(),
        };
        assert_eq!(error.to_string(), "failed to make strategy from pnpm");
    }

    #[test]
    fn test_user_friendly_error_finds_wrapped_error() {
        let result: anyhow::Result<()> = Err(LockforgeError::UnknownEcosystem {
            name: "pnpm".to_string(),
        })
        .context("Failed to build package manager registry");

        let context = user_friendly_error(result.unwrap_err());
        assert!(matches!(context.error, LockforgeError::UnknownEcosystem { .. }));
        assert!(context.suggestion.unwrap().contains("lockforge ecosystems"));
        assert_eq!(context.details.as_deref(), Some("Failed to build package manager registry"));
    }

    #[test]
    fn test_user_friendly_error_plain_anyhow() {
        let context = user_friendly_error(anyhow::anyhow!("something odd"));
        assert!(context.to_string().contains("something odd"));
    }

    #[test]
    fn test_error_context_display() {
        let context = ErrorContext::new(LockforgeError::PathNotFound {
            path: "/missing".to_string(),
        })
        .with_details("while scanning")
        .with_suggestion("check it");

        let rendered = context.to_string();
        assert!(rendered.contains("path does not exist: /missing"));
        assert!(rendered.contains("Details: while scanning"));
        assert!(rendered.contains("Suggestion: check it"));
    }
}
