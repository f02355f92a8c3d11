//! The `ecosystems` command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fmt::Write;
use std::path::Path;
use std::process::ExitCode;

use crate::config::ResolveConfig;
use crate::resolution::{Ecosystem, Registry};
use crate::utils::command_exists;

/// List supported package managers in registry order.
///
/// The order is the match order: the first package manager whose pattern
/// matches a file name resolves it.
#[derive(Args, Debug)]
pub struct EcosystemsCommand {
    /// Show package.json claimed by npm instead of yarn
    #[arg(long)]
    prefer_npm: bool,
}

impl EcosystemsCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<ExitCode> {
        let mut config = ResolveConfig::load(config_path).await?;
        config.prefer_npm |= self.prefer_npm;

        let registry = Registry::from_config(&config)?;
        print!("{}", render(&registry, |eco| command_exists(&tool_for(&config, eco))));
        Ok(ExitCode::SUCCESS)
    }
}

fn tool_for(config: &ResolveConfig, ecosystem: Ecosystem) -> String {
    let tool = match ecosystem {
        Ecosystem::Pip => config.python.as_str(),
        other => other.tool(),
    };
    config.tools.get(tool).cloned().unwrap_or_else(|| tool.to_string())
}

fn render(registry: &Registry, available: impl Fn(Ecosystem) -> bool) -> String {
    let mut out = String::new();
    for pm in registry.package_managers() {
        let patterns: Vec<&str> = pm.manifest_patterns().iter().map(regex::Regex::as_str).collect();
        let status = match pm.name().parse::<Ecosystem>() {
            Ok(eco) if available(eco) => format!("{} found", eco.tool()).green(),
            Ok(eco) => format!("{} not found", eco.tool()).yellow(),
            Err(_) => "custom".normal(),
        };
        let _ = writeln!(out, "{:<10} {:<44} {}", pm.name().bold(), patterns.join(" "), status);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_registry_order() {
        colored::control::set_override(false);
        let registry = Registry::builtin(false).unwrap();
        let out = render(&registry, |eco| eco == Ecosystem::Cargo);
        let names: Vec<&str> = out.lines().filter_map(|l| l.split_whitespace().next()).collect();
        assert_eq!(names.first(), Some(&"maven"));
        assert_eq!(names.last(), Some(&"cargo"));
        assert_eq!(names.len(), Ecosystem::ALL.len());
        assert!(out.lines().last().unwrap().ends_with("cargo found"));
        assert!(out.contains("mvn not found"));
        assert!(out.contains(r"^pom\.xml$"));
    }

    #[test]
    fn test_prefer_npm_order() {
        colored::control::set_override(false);
        let out = render(&Registry::builtin(true).unwrap(), |_| true);
        let npm = out.find("npm ").unwrap();
        let yarn = out.find("yarn ").unwrap();
        assert!(npm < yarn);
    }

    #[test]
    fn test_tool_override() {
        let mut config = ResolveConfig::default();
        config.tools.insert("mvn".to_string(), "/opt/maven/bin/mvn".to_string());
        assert_eq!(tool_for(&config, Ecosystem::Maven), "/opt/maven/bin/mvn");
        assert_eq!(tool_for(&config, Ecosystem::Pip), config.python);
    }
}
