//! Regex-driven classification of tool failures.
//!
//! Each ecosystem owns a [`Classifier`]: the tool's display name, an install
//! hint, and an ordered list of [`Rule`]s. The first rule whose pattern
//! matches the failure text decides the [`ErrorKind`] and builds the
//! documentation from the capture groups.
//!
//! Failures that never reach the tool are decided structurally before any
//! rule is consulted, so a missing executable is always reported as
//! [`ErrorKind::ExecutableNotFound`] whatever the rule table says.

use regex::{Captures, Regex};

use super::command::ToolError;
use super::error::ErrorKind;

/// Documentation attached when no rule matches.
pub const UNCLASSIFIED_DOCUMENTATION: &str = "No specific documentation for this problem yet. \
     Please inspect the error output above, and report it to the maintainers if it looks like a lockforge problem.";

/// Builds documentation from the captures of a matching rule.
pub type DocBuilder = fn(&Captures<'_>) -> String;

/// One `(pattern, documentation-builder)` pair.
pub struct Rule {
    kind: ErrorKind,
    pattern: Regex,
    document: DocBuilder,
}

impl Rule {
    /// Compile a rule. Patterns are compile-time constants, so a bad one is a
    /// programming error.
    #[allow(clippy::expect_used)]
    pub fn new(kind: ErrorKind, pattern: &str, document: DocBuilder) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("classification pattern must compile"),
            document,
        }
    }
}

/// Ordered rule table for one ecosystem.
pub struct Classifier {
    tool: &'static str,
    install_hint: &'static str,
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(tool: &'static str, install_hint: &'static str, rules: Vec<Rule>) -> Self {
        Self {
            tool,
            install_hint,
            rules,
        }
    }

    pub fn tool(&self) -> &'static str {
        self.tool
    }

    /// Map a tool failure to its diagnosis and remediation text.
    pub fn classify(&self, failure: &ToolError) -> (ErrorKind, String) {
        match failure {
            ToolError::NotFound {
                program,
            } => (
                ErrorKind::ExecutableNotFound,
                format!(
                    "{} wasn't found (looked for '{program}'). Please check that {} is installed and available in your PATH. {}",
                    self.tool, self.tool, self.install_hint
                ),
            ),
            ToolError::PermissionDenied {
                program,
            } => (
                ErrorKind::PermissionDenied,
                format!(
                    "Couldn't execute '{program}' due to a permission error. Make sure the file is executable, for example with `chmod +x {program}`."
                ),
            ),
            ToolError::Spawn {
                ..
            } => self.classify_text(&failure.to_string()),
            ToolError::Failed {
                ..
            } => self.classify_text(&failure.output_text()),
        }
    }

    /// Apply the rule table to raw failure text.
    pub fn classify_text(&self, text: &str) -> (ErrorKind, String) {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(text).map(|caps| (rule.kind, (rule.document)(&caps))))
            .unwrap_or_else(|| (ErrorKind::Unclassified, UNCLASSIFIED_DOCUMENTATION.to_string()))
    }
}

/// Capture group `index`, or a fallback when the group did not participate.
pub fn group<'a>(caps: &'a Captures<'_>, index: usize, fallback: &'a str) -> &'a str {
    caps.get(index).map_or(fallback, |m| m.as_str())
}

/// Documentation shared by every ecosystem for unreachable registries.
pub fn network_documentation(registry: &str) -> String {
    format!(
        "Failed to reach {registry}. Please check your network connection and proxy settings, \
         and make sure the registry is reachable from this machine."
    )
}

/// Documentation shared by every ecosystem for permission failures.
pub fn permission_documentation(path: &str) -> String {
    format!(
        "Couldn't access '{path}' due to a permission error. Make sure the current user can read and \
         write the project directory and the tool's cache."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(
            "demo",
            "Install demo from https://example.com.",
            vec![
                Rule::new(ErrorKind::DependencyNotFound, r"package (\S+) not found", |caps| {
                    format!("Couldn't find {}", group(caps, 1, "a package"))
                }),
                Rule::new(ErrorKind::RegistryUnreachable, r"ENOTFOUND (\S+)", |caps| {
                    network_documentation(group(caps, 1, "the registry"))
                }),
                Rule::new(ErrorKind::ToolInternalFailure, r"not found", |_| "generic".to_string()),
            ],
        )
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let (kind, doc) = classifier().classify_text("error: package left-pad not found");
        assert_eq!(kind, ErrorKind::DependencyNotFound);
        assert_eq!(doc, "Couldn't find left-pad");
    }

    #[test]
    fn test_captures_reach_documentation() {
        let (kind, doc) = classifier().classify_text("getaddrinfo ENOTFOUND registry.example.org");
        assert_eq!(kind, ErrorKind::RegistryUnreachable);
        assert!(doc.contains("registry.example.org"));
        assert!(doc.contains("network connection"));
    }

    #[test]
    fn test_no_match_is_unclassified() {
        let (kind, doc) = classifier().classify_text("segmentation fault");
        assert_eq!(kind, ErrorKind::Unclassified);
        assert_eq!(doc, UNCLASSIFIED_DOCUMENTATION);
    }

    #[test]
    fn test_missing_executable_ignores_rules() {
        let failure = ToolError::NotFound {
            program: "demo".to_string(),
        };
        // The generic "not found" rule would match the message text
        let (kind, doc) = classifier().classify(&failure);
        assert_eq!(kind, ErrorKind::ExecutableNotFound);
        assert!(doc.contains("demo wasn't found"));
        assert!(doc.contains("https://example.com"));
    }

    #[test]
    fn test_permission_denied_on_exec() {
        let failure = ToolError::PermissionDenied {
            program: "./gradlew".to_string(),
        };
        let (kind, doc) = classifier().classify(&failure);
        assert_eq!(kind, ErrorKind::PermissionDenied);
        assert!(doc.contains("chmod +x ./gradlew"));
    }
}
