//! Integration test suite for lockforge
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scenarios**: the resolution engine end to end with a scripted command runner
//! - **fake_tools**: the binary driving shell scripts that stand in for real tools (unix only)
//! - **cli**: argument handling, exit codes and report formats of the binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
#[cfg(unix)]
mod fake_tools;
mod scenarios;
