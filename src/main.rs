//! `sensei`: scripted mock-interview sequencer

use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

use interview_sensei::cli::args::Cli;
use interview_sensei::cli::commands;
use interview_sensei::error::ExitCode;
use interview_sensei::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    // First signal cancels the session; a second one exits immediately.
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                None
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            () = recv_term(sigterm.as_mut()) => {}
        }

        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        shutdown.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            () = recv_term(sigterm.as_mut()) => std::process::exit(ExitCode::TERMINATED),
        }
    });

    let result = commands::dispatch(cli, cancel).await;

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn recv_term(sigterm: Option<&mut tokio::signal::unix::Signal>) {
    match sigterm {
        Some(s) => {
            s.recv().await;
        }
        None => std::future::pending().await,
    }
}
