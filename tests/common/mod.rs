//! Shared integration-test harness for running the `sensei` binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command as AsyncCommand};

/// Upper bound for an interactive session to exit.
pub const EXIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Helpers for spawning `sensei`.
pub struct SenseiProcess;

impl SenseiProcess {
    /// Runs `sensei` with `args` to completion and returns its output.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_sensei"))
            .args(args)
            .env_remove("SENSEI_LOG_LEVEL")
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .output()
            .expect("failed to run sensei")
    }

    /// Spawns an interactive `sensei` with piped stdin and stdout.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_interactive(args: &[&str]) -> Child {
        AsyncCommand::new(env!("CARGO_BIN_EXE_sensei"))
            .args(args)
            .env("NO_COLOR", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn sensei")
    }

    /// Writes one command line to an interactive session.
    #[allow(clippy::missing_panics_doc)]
    pub async fn send_line(child: &mut Child, line: &str) {
        let stdin = child.stdin.as_mut().expect("stdin not captured");
        stdin
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("failed to write to sensei");
        stdin.flush().await.expect("failed to flush stdin");
    }

    /// Waits for an interactive session to exit and collects its output.
    #[allow(clippy::missing_panics_doc)]
    pub async fn finish(child: Child) -> Output {
        tokio::time::timeout(EXIT_TIMEOUT, child.wait_with_output())
            .await
            .expect("sensei did not exit in time")
            .expect("failed to collect sensei output")
    }

    /// Returns the path to a test fixture.
    #[must_use]
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }
}
