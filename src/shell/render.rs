//! Text rendering of a session snapshot.
//!
//! Produces one frame per call. The runtime prints a frame for every
//! published view; nothing here keeps state between frames.

use std::fmt::Write as _;

use console::Style;

use crate::config::schema::ScriptConfig;
use crate::sequencer::{HintCategory, Phase, SequencerState};

use super::state::ShellState;

/// Shown in the interviewer panel before any question text appears.
pub const QUESTION_PLACEHOLDER: &str = "Interviewer is about to ask a question...";

/// Shown in the candidate panel while the question is still being asked.
pub const ANSWER_PLACEHOLDER: &str = "Waiting for the question...";

const CONTROLS: &str = "p pause | r resume | s skip | a again | m mic | v video | c sidebar | h hints | d analytics | n <text> notes | e end | q quit";

/// Formats a duration in milliseconds as `mm:ss`.
///
/// Minutes keep counting past 59.
#[must_use]
pub fn format_elapsed(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

struct Palette {
    accent: Style,
    heading: Style,
    dim: Style,
    good: Style,
    warn: Style,
}

impl Palette {
    fn new(colors: bool, dark: bool) -> Self {
        let base = Style::new().force_styling(colors);
        let accent = if dark {
            base.clone().magenta().bold()
        } else {
            base.clone().cyan().bold()
        };
        Self {
            accent,
            heading: base.clone().bold(),
            dim: base.clone().dim(),
            good: base.clone().green(),
            warn: base.yellow(),
        }
    }
}

/// Renders one frame for `state` inside the given shell.
#[must_use]
pub fn render(
    state: &SequencerState,
    shell: &ShellState,
    script: &ScriptConfig,
    colors: bool,
) -> String {
    let palette = Palette::new(colors, shell.dark_mode);
    let persona = script.session.persona.profile();
    let mut out = String::new();

    // Header
    let progress = if state.turn_count == 0 {
        "no questions".to_string()
    } else {
        format!("Question {} of {}", state.turn_index + 1, state.turn_count)
    };
    let status = if !state.session_active && state.turn_count > 0 && state.elapsed_ms > 0 {
        " ended"
    } else if state.is_paused {
        " paused"
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "{} | {} | {} | {}{}{}",
        palette.heading.apply_to(&script.session.title),
        script.session.interview_type.label(),
        palette.accent.apply_to(format_elapsed(state.elapsed_ms)),
        progress,
        if shell.recording { " | REC" } else { "" },
        palette.warn.apply_to(status),
    );

    // Interviewer
    let _ = writeln!(
        out,
        "{} ({}){}",
        palette.accent.apply_to(persona.name),
        persona.role,
        speaking_marker(state.interviewer_speaking),
    );
    if !state.revealed_question.is_empty() {
        let _ = writeln!(out, "  {}", state.revealed_question);
    } else if state.phase != Phase::Idle {
        let _ = writeln!(out, "  {}", palette.dim.apply_to(QUESTION_PLACEHOLDER));
    }

    // Candidate
    let media = format!(
        "mic {} | video {}",
        on_off(shell.mic_on),
        on_off(shell.video_on)
    );
    let _ = writeln!(
        out,
        "{}{} [{}]",
        palette.accent.apply_to("You"),
        speaking_marker(state.candidate_speaking),
        media,
    );
    if state.revealed_answer.is_empty() {
        if matches!(state.phase, Phase::AskingQuestion | Phase::PausedAfterQuestion) {
            let _ = writeln!(out, "  {}", palette.dim.apply_to(ANSWER_PLACEHOLDER));
        }
    } else {
        let _ = writeln!(out, "  {}", state.revealed_answer);
    }

    if !shell.sidebar_collapsed {
        render_sidebar(&mut out, state, shell, &palette);
    }

    if let Some(feedback) = &state.feedback {
        let marker = if shell.has_unread { " (new)" } else { "" };
        let _ = writeln!(out, "{}{marker}", palette.heading.apply_to("Feedback"));
        for line in feedback {
            let _ = writeln!(out, "  {} {line}", palette.good.apply_to("+"));
        }
    }

    if shell.notes_visible && !shell.notes.is_empty() {
        let _ = writeln!(out, "{}", palette.heading.apply_to("Notes"));
        let _ = writeln!(out, "  {}", shell.notes);
    }

    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "{} {}", palette.warn.apply_to("!"), notice.message);
    }

    if shell.settings_visible {
        let _ = writeln!(
            out,
            "{} persona={} style={} dark_mode={}",
            palette.dim.apply_to("settings:"),
            persona.name,
            persona.style,
            on_off(shell.dark_mode),
        );
    }

    let _ = write!(out, "{}", palette.dim.apply_to(CONTROLS));
    out
}

fn render_sidebar(out: &mut String, state: &SequencerState, shell: &ShellState, palette: &Palette) {
    if shell.hints_visible && !state.hints.is_blank() {
        let typing = if state.hints_typing { " ..." } else { "" };
        let _ = writeln!(out, "{}{typing}", palette.heading.apply_to("Hints"));
        for category in HintCategory::ALL {
            let items: Vec<_> = state
                .hints
                .items(category)
                .iter()
                .filter(|item| !item.is_empty())
                .collect();
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(out, "  {}", palette.dim.apply_to(category.label()));
            for item in items {
                let _ = writeln!(out, "    - {item}");
            }
        }
    }

    if shell.analytics_visible {
        let live = &state.live_scores;
        let _ = writeln!(
            out,
            "{} confidence {:.0} | completeness {:.0} | technical {:.0}",
            palette.heading.apply_to("Live"),
            live.confidence,
            live.completeness,
            live.technical_accuracy,
        );
        let _ = writeln!(
            out,
            "{} {}%",
            palette.heading.apply_to("Overall"),
            palette.good.apply_to(state.performance.overall()),
        );
        for (label, value) in state.performance.entries() {
            let _ = writeln!(out, "  {label:<20} {value:>5.1}");
        }
    }
}

const fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

const fn speaking_marker(speaking: bool) -> &'static str {
    if speaking { " [speaking]" } else { "" }
}
