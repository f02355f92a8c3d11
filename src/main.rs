//! lockforge CLI entry point
//!
//! Parses arguments, installs logging, runs the command and turns any
//! infrastructure error into a colored message with a suggestion.
//!
//! - `resolve` - generate lock artifacts for every manifest found
//! - `ecosystems` - list the supported package managers

use clap::Parser;
use lockforge::cli;
use lockforge::core::error::user_friendly_error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    cli.init_logging();

    match cli.execute().await {
        Ok(code) => code,
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            ExitCode::FAILURE
        }
    }
}
