//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod scripts;
pub mod session;
pub mod version;

use std::io::IsTerminal;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, ColorChoice, Commands, ScriptsSubcommand, SessionSubcommand};
use crate::error::Result;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let colors = frame_colors(cli.color);
    match cli.command {
        Commands::Session(cmd) => match cmd.subcommand {
            SessionSubcommand::Run(args) => session::run(&args, colors, cancel).await,
            SessionSubcommand::Simulate(args) => session::simulate(&args).await,
            SessionSubcommand::Validate(args) => session::validate(&args).await,
        },
        Commands::Scripts(cmd) => match cmd.subcommand {
            ScriptsSubcommand::List(args) => scripts::list(&args).await,
            ScriptsSubcommand::Show(args) => scripts::show(&args).await,
        },
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Whether rendered frames on stdout should carry ANSI colours.
fn frame_colors(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Auto => {
            std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}
