//! CLI argument definitions
//!
//! All Clap derive structs for `sensei` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::schema::InterviewType;
use crate::observability::LogFormat;
use crate::scripts::DEFAULT_SCRIPT;

// ============================================================================
// Root CLI
// ============================================================================

/// Scripted mock-interview sequencer.
#[derive(Parser, Debug)]
#[command(name = "sensei", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "SENSEI_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "SENSEI_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run, simulate or validate interview sessions.
    Session(SessionCommand),

    /// Browse the built-in interview scripts.
    Scripts(ScriptsCommand),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Session Command
// ============================================================================

/// Session commands.
#[derive(Args, Debug)]
pub struct SessionCommand {
    /// Session subcommand.
    #[command(subcommand)]
    pub subcommand: SessionSubcommand,
}

/// Session subcommands.
#[derive(Subcommand, Debug)]
pub enum SessionSubcommand {
    /// Play a session interactively in the terminal.
    Run(SessionRunArgs),

    /// Replay a session in virtual time and print its timeline.
    Simulate(SessionSimulateArgs),

    /// Validate script files without running them.
    Validate(SessionValidateArgs),
}

/// Where the script comes from.
#[derive(Args, Debug, Clone)]
#[command(group = clap::ArgGroup::new("source").multiple(false))]
pub struct ScriptSource {
    /// Path to a YAML script file.
    #[arg(short, long, group = "source", env = "SENSEI_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Name of a built-in script.
    #[arg(short, long, group = "source", env = "SENSEI_BUILTIN")]
    pub builtin: Option<String>,
}

impl ScriptSource {
    /// Built-in script name to fall back on when no file is given.
    #[must_use]
    pub fn builtin_or_default(&self) -> &str {
        self.builtin.as_deref().unwrap_or(DEFAULT_SCRIPT)
    }
}

/// Arguments for `session run`.
#[derive(Args, Debug)]
pub struct SessionRunArgs {
    #[command(flatten)]
    pub source: ScriptSource,

    /// Playback speed multiplier.
    #[arg(long, default_value_t = 1.0, env = "SENSEI_SPEED")]
    pub speed: f64,

    /// Override the analysis seed.
    #[arg(long, env = "SENSEI_SEED")]
    pub seed: Option<u64>,

    /// Override the session time limit (e.g. "15m").
    #[arg(long, value_parser = humantime::parse_duration, env = "SENSEI_MAX_DURATION")]
    pub max_duration: Option<Duration>,

    /// Refuse camera access when video is switched on.
    #[arg(long)]
    pub deny_camera: bool,

    /// Do not draw frames; only log and emit events.
    #[arg(long)]
    pub no_render: bool,

    /// Write JSONL session events to this file.
    #[arg(long, env = "SENSEI_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "SENSEI_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `session simulate`.
#[derive(Args, Debug)]
pub struct SessionSimulateArgs {
    #[command(flatten)]
    pub source: ScriptSource,

    /// Virtual time to simulate (e.g. "30s", "2m").
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    pub until: Duration,

    /// Override the analysis seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `session validate`.
#[derive(Args, Debug)]
pub struct SessionValidateArgs {
    /// Script files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Scripts Command
// ============================================================================

/// Built-in script commands.
#[derive(Args, Debug)]
pub struct ScriptsCommand {
    /// Scripts subcommand.
    #[command(subcommand)]
    pub subcommand: ScriptsSubcommand,
}

/// Built-in script subcommands.
#[derive(Subcommand, Debug)]
pub enum ScriptsSubcommand {
    /// List built-in scripts.
    List(ScriptsListArgs),

    /// Print the YAML of a built-in script.
    Show(ScriptsShowArgs),
}

/// Arguments for `scripts list`.
#[derive(Args, Debug)]
pub struct ScriptsListArgs {
    /// Only list scripts of this interview type.
    #[arg(long = "type")]
    pub interview_type: Option<InterviewType>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `scripts show`.
#[derive(Args, Debug)]
pub struct ScriptsShowArgs {
    /// Script name.
    pub name: String,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> SessionRunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Session(SessionCommand {
                subcommand: SessionSubcommand::Run(args),
            }) => args,
            other => panic!("expected session run, got {other:?}"),
        }
    }

    #[test]
    fn test_session_run_defaults_to_builtin() {
        let args = run_args(&["sensei", "session", "run"]);
        assert!(args.source.script.is_none());
        assert_eq!(args.source.builtin_or_default(), DEFAULT_SCRIPT);
        assert!((args.speed - 1.0).abs() < f64::EPSILON);
        assert!(!args.deny_camera);
    }

    #[test]
    fn test_script_and_builtin_mutually_exclusive() {
        let cli = Cli::try_parse_from([
            "sensei",
            "session",
            "run",
            "--script",
            "a.yaml",
            "--builtin",
            "quick-demo",
        ]);
        assert!(cli.is_err(), "Expected mutual exclusion error");
    }

    #[test]
    fn test_max_duration_parses_humantime() {
        let args = run_args(&["sensei", "session", "run", "--max-duration", "15m"]);
        assert_eq!(args.max_duration, Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_simulate_until() {
        let cli =
            Cli::try_parse_from(["sensei", "session", "simulate", "--until", "2m", "-f", "json"])
                .unwrap();
        let Commands::Session(SessionCommand {
            subcommand: SessionSubcommand::Simulate(args),
        }) = cli.command
        else {
            panic!("expected session simulate");
        };
        assert_eq!(args.until, Duration::from_secs(120));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["sensei", "session", "validate"]).is_err());
    }

    #[test]
    fn test_scripts_list_type_filter() {
        let cli =
            Cli::try_parse_from(["sensei", "scripts", "list", "--type", "system-design"]).unwrap();
        let Commands::Scripts(ScriptsCommand {
            subcommand: ScriptsSubcommand::List(args),
        }) = cli.command
        else {
            panic!("expected scripts list");
        };
        assert_eq!(args.interview_type, Some(InterviewType::SystemDesign));
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["sensei", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["sensei", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Auto);
    }
}
