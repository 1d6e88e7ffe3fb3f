//! Session command handlers
//!
//! Implements `session run`, `session simulate`, and `session validate`.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::args::{
    OutputFormat, ScriptSource, SessionRunArgs, SessionSimulateArgs, SessionValidateArgs,
};
use crate::clock::{ManualClock, TokioClock};
use crate::config::loader::{LoadResult, LoaderOptions, ScriptLoader};
use crate::config::schema::ScriptConfig;
use crate::error::{ConfigError, Result, SessionError};
use crate::media::{MediaDevices, StaticMediaDevices};
use crate::observability::{EventEmitter, RunSummary, StopReason, init_metrics};
use crate::runtime::{COMMAND_HELP, SessionCommand, SessionRuntime, SessionView};
use crate::scripts;
use crate::sequencer::reveal::duration_ms;
use crate::sequencer::{NoticeKind, Sequencer, SequencerState};
use crate::shell::{format_elapsed, render};

/// Play a session in the terminal.
///
/// Commands are read line by line from stdin; frames are printed to stdout.
///
/// # Errors
///
/// Returns a usage error for an unknown built-in script, a config error
/// if the script fails to load, or a session error for an invalid speed
/// or a failed background task.
pub async fn run(args: &SessionRunArgs, colors: bool, cancel: CancellationToken) -> Result<()> {
    if !(args.speed.is_finite() && args.speed > 0.0) {
        return Err(SessionError::InvalidSpeed(args.speed).into());
    }

    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    let mut script = load_script(&args.source, &ScriptLoader::with_defaults())?;
    if let Some(seed) = args.seed {
        script.analysis.seed = seed;
    }
    if let Some(limit) = args.max_duration {
        script.session.max_duration = Some(limit);
    }
    let script = Arc::new(script);

    let events = match args.events_file {
        Some(ref path) => EventEmitter::from_file(path)?,
        None => EventEmitter::noop(),
    };
    let media: Arc<dyn MediaDevices> = if args.deny_camera {
        Arc::new(StaticMediaDevices::denying())
    } else {
        Arc::new(StaticMediaDevices::granting())
    };

    let runtime = SessionRuntime::new(
        Sequencer::new(TokioClock::with_speed(args.speed)),
        Arc::clone(&script),
        media,
        Arc::new(events),
        cancel,
    );

    let (tx, rx) = mpsc::channel(32);
    let input = tokio::spawn(read_commands(tx));
    let renderer = (!args.no_render)
        .then(|| tokio::spawn(render_views(runtime.subscribe(), Arc::clone(&script), colors)));

    let (summary, reason) = runtime.run(rx).await?;
    input.abort();

    if let Some(renderer) = renderer {
        renderer
            .await
            .map_err(|e| SessionError::TaskFailed(e.to_string()))?;
    }

    println!("\nSession {reason}: {summary}");
    Ok(())
}

/// Replay a session against a virtual clock and print every state change.
///
/// # Errors
///
/// Returns a usage error for an unknown built-in script, or a config error
/// if the script fails to load.
#[allow(clippy::unused_async)]
pub async fn simulate(args: &SessionSimulateArgs) -> Result<()> {
    let mut script = load_script(&args.source, &ScriptLoader::with_defaults())?;
    if let Some(seed) = args.seed {
        script.analysis.seed = seed;
    }
    let report = simulate_script(Arc::new(script), duration_ms(args.until));

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human => print!("{}", report.to_human()),
    }
    Ok(())
}

/// Validate script files without running them.
///
/// # Errors
///
/// Returns the first load or validation error after every file has been
/// checked and reported.
#[allow(clippy::unused_async)]
pub async fn validate(args: &SessionValidateArgs) -> Result<()> {
    let loader = ScriptLoader::new(LoaderOptions {
        strict: args.strict,
        ..LoaderOptions::default()
    });

    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_error: Option<ConfigError> = None;
    for path in &args.files {
        info!(file = %path.display(), "validating script");
        let report = match loader.load(path) {
            Ok(result) => {
                log_warnings(&result);
                FileReport::valid(path, &result)
            }
            Err(e) => {
                let report = FileReport::invalid(path, &e);
                first_error.get_or_insert(e);
                report
            }
        };
        reports.push(report);
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Human => {
            for report in &reports {
                print!("{}", report.to_human());
            }
        }
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

// ============================================================================
// Script loading
// ============================================================================

/// Loads the script named by `source`, logging its warnings.
fn load_script(source: &ScriptSource, loader: &ScriptLoader) -> Result<ScriptConfig> {
    let result = if let Some(ref path) = source.script {
        info!(script = %path.display(), "loading script");
        loader.load(path)?
    } else {
        let name = source.builtin_or_default();
        info!(builtin = name, "loading built-in script");
        scripts::require_script(name)?.load(loader)?
    };
    log_warnings(&result);
    Ok((*result.script).clone())
}

fn log_warnings(result: &LoadResult) {
    for warning in &result.warnings {
        warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
}

// ============================================================================
// Interactive I/O tasks
// ============================================================================

/// Forwards parsed stdin lines to the runtime until EOF.
async fn read_commands(tx: mpsc::Sender<SessionCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("stdin closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "?" | "help") {
            eprintln!("{COMMAND_HELP}");
            continue;
        }
        match line.parse::<SessionCommand>() {
            Ok(command) => {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }
}

/// Prints a frame for every published view until the runtime is dropped.
async fn render_views(
    mut views: watch::Receiver<SessionView>,
    script: Arc<ScriptConfig>,
    colors: bool,
) {
    while views.changed().await.is_ok() {
        let view = views.borrow_and_update().clone();
        println!("{}\n", render(&view.state, &view.shell, &script, colors));
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// One recorded state change.
#[derive(Debug, Serialize)]
pub struct TimelineEntry {
    /// Virtual time of the change
    pub at_ms: u64,
    /// What changed, in words
    pub change: String,
    /// Full state after the change
    pub state: SequencerState,
}

/// Result of a virtual-time replay.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    /// Script title
    pub title: String,
    /// Requested virtual-time horizon
    pub horizon_ms: u64,
    /// Why the replay stopped
    pub reason: StopReason,
    /// End-of-replay statistics
    pub summary: RunSummary,
    /// Every state change, in order
    pub timeline: Vec<TimelineEntry>,
}

impl SimulationReport {
    fn to_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} (simulated to {})",
            self.title,
            format_elapsed(self.horizon_ms)
        );
        for entry in &self.timeline {
            let _ = writeln!(
                out,
                "{:>8}ms  turn {:<3} {:<22} {}",
                entry.at_ms,
                entry.state.turn_index + 1,
                entry.state.phase,
                entry.change
            );
        }
        let _ = writeln!(out, "stopped: {}", self.reason);
        let _ = writeln!(out, "{}", self.summary);
        out
    }
}

/// Replays `script` from virtual time 0 up to and including `horizon_ms`.
#[must_use]
pub fn simulate_script(script: Arc<ScriptConfig>, horizon_ms: u64) -> SimulationReport {
    let clock = ManualClock::new();
    let mut sequencer = Sequencer::new(clock.clone());
    let mut timeline = Vec::new();
    let mut prev = sequencer.state().clone();

    let mut record = |snapshots: Vec<SequencerState>, timeline: &mut Vec<TimelineEntry>| {
        for state in snapshots {
            timeline.push(TimelineEntry {
                at_ms: state.updated_at_ms,
                change: describe(&prev, &state),
                state: state.clone(),
            });
            prev = state;
        }
    };

    record(sequencer.start(Arc::clone(&script)), &mut timeline);
    while !sequencer.is_ended() {
        let Some(deadline) = sequencer.next_deadline() else {
            break;
        };
        if deadline > horizon_ms {
            break;
        }
        clock.set(deadline);
        record(sequencer.poll(), &mut timeline);
    }

    let reason = if sequencer.is_ended() {
        match sequencer.state().notice.as_ref().map(|n| n.kind) {
            Some(NoticeKind::SessionLimit) => StopReason::TimeLimit,
            _ => StopReason::Ended,
        }
    } else {
        clock.set(horizon_ms);
        StopReason::Horizon
    };

    SimulationReport {
        title: script.session.title.clone(),
        horizon_ms,
        reason,
        summary: RunSummary {
            turns_completed: sequencer.state().turns_completed,
            phase_transitions: sequencer.transitions(),
            notices: sequencer.notices(),
            stale_timers: sequencer.stale_timers(),
            elapsed_ms: sequencer.elapsed_ms(),
        },
        timeline,
    }
}

/// Summarizes what differs between two consecutive snapshots.
fn describe(prev: &SequencerState, next: &SequencerState) -> String {
    let mut changes = Vec::new();
    if next.turn_index != prev.turn_index || next.turns_completed != prev.turns_completed {
        changes.push(format!("turn {} begins", next.turn_index + 1));
    }
    if next.phase != prev.phase {
        changes.push(format!("enter {}", next.phase));
    }
    if next.revealed_question != prev.revealed_question && !next.revealed_question.is_empty() {
        changes.push(format!("question \"{}\"", next.revealed_question));
    }
    if next.revealed_answer != prev.revealed_answer && !next.revealed_answer.is_empty() {
        changes.push(format!("answer \"{}\"", next.revealed_answer));
    }
    if next.hints != prev.hints && !next.hints.is_blank() {
        changes.push("hints".to_string());
    }
    if next.hints_typing != prev.hints_typing {
        changes.push(format!(
            "hints typing {}",
            if next.hints_typing { "on" } else { "off" }
        ));
    }
    if next.live_scores != prev.live_scores && next.phase == prev.phase {
        changes.push(format!(
            "analysis overall {}%",
            next.performance.overall()
        ));
    }
    if let Some(feedback) = &next.feedback
        && prev.feedback.is_none()
    {
        changes.push(format!("feedback: {}", feedback.join("; ")));
    }
    match (&prev.notice, &next.notice) {
        (_, Some(n)) if prev.notice.as_ref().map(|p| p.id) != Some(n.id) => {
            changes.push(format!("notice \"{}\"", n.message));
        }
        (Some(_), None) => changes.push("notice cleared".to_string()),
        _ => {}
    }
    if changes.is_empty() {
        "restart".to_string()
    } else {
        changes.join(", ")
    }
}

// ============================================================================
// Validation report
// ============================================================================

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    turns: Option<usize>,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileReport {
    fn valid(path: &Path, result: &LoadResult) -> Self {
        Self {
            file: path.display().to_string(),
            valid: true,
            title: Some(result.script.session.title.clone()),
            turns: Some(result.script.turns.len()),
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
            error: None,
        }
    }

    fn invalid(path: &Path, error: &ConfigError) -> Self {
        Self {
            file: path.display().to_string(),
            valid: false,
            title: None,
            turns: None,
            warnings: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    fn to_human(&self) -> String {
        let mut out = String::new();
        match (&self.error, self.turns) {
            (Some(error), _) => {
                let _ = writeln!(out, "invalid  {}: {error}", self.file);
            }
            (None, turns) => {
                let _ = writeln!(
                    out,
                    "ok       {} ({} turns, {} warnings)",
                    self.file,
                    turns.unwrap_or_default(),
                    self.warnings.len()
                );
            }
        }
        for warning in &self.warnings {
            let _ = writeln!(out, "  warning: {warning}");
        }
        out
    }
}
