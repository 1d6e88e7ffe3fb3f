//! Sequencer state record
//!
//! [`SequencerState`] is the single owned record the sequencer mutates.
//! Every mutation hands a clone of it to the caller, so it derives
//! `Serialize` for the event stream and the `simulate` timeline.

use serde::Serialize;

use crate::analysis::{LiveScores, PerformanceMetrics};

use super::hints::HintBoard;

/// Position in the per-turn dialogue cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not running
    #[default]
    Idle,
    /// Interviewer's question is being revealed
    AskingQuestion,
    /// Gap between question and answer
    PausedAfterQuestion,
    /// Candidate's answer is being revealed
    AwaitingAnswer,
    /// Gap between answer and the next turn
    PausedAfterAnswer,
}

impl Phase {
    /// Every phase, in cycle order.
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::AskingQuestion,
        Self::PausedAfterQuestion,
        Self::AwaitingAnswer,
        Self::PausedAfterAnswer,
    ];

    /// Stable snake-case name, used in logs and metric labels.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AskingQuestion => "asking_question",
            Self::PausedAfterQuestion => "paused_after_question",
            Self::AwaitingAnswer => "awaiting_answer",
            Self::PausedAfterAnswer => "paused_after_answer",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Session generation.
///
/// Every timer is stamped with the generation current when it was
/// scheduled; bumping the generation makes all outstanding timers inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the following generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// What raised a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Post-answer analysis finished
    Analysis,
    /// The user ended the session
    SessionEnded,
    /// Notes were saved
    NotesSaved,
    /// Camera permission was refused
    MediaDenied,
    /// The session reached its configured time limit
    SessionLimit,
}

impl NoticeKind {
    /// Stable snake-case name, used as a metric label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::SessionEnded => "session_ended",
            Self::NotesSaved => "notes_saved",
            Self::MediaDenied => "media_denied",
            Self::SessionLimit => "session_limit",
        }
    }
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Unique id within the session
    pub id: u64,
    /// Message text
    pub message: String,
    /// Source of the notice
    pub kind: NoticeKind,
    /// Virtual time the notice was raised
    pub raised_at_ms: u64,
    /// Virtual time the notice disappears (`None` keeps it until replaced)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
}

/// Snapshot of everything the shell needs to render.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SequencerState {
    /// Current phase
    pub phase: Phase,
    /// Revealed prefix of the current question
    pub revealed_question: String,
    /// Revealed prefix of the current answer
    pub revealed_answer: String,
    /// Index of the current turn, modulo the script length
    pub turn_index: usize,
    /// Number of turns in the script
    pub turn_count: usize,
    /// Number of completed turns since start
    pub turns_completed: u64,
    /// Whether the session is paused
    pub is_paused: bool,
    /// Whether the session is still live (false once ended)
    pub session_active: bool,
    /// Unpaused running time at the last mutation
    pub elapsed_ms: u64,
    /// Virtual time of the last mutation
    pub updated_at_ms: u64,
    /// Current generation
    pub generation: Generation,
    /// Interviewer avatar is speaking
    pub interviewer_speaking: bool,
    /// Candidate is speaking
    pub candidate_speaking: bool,
    /// Revealed hint text
    pub hints: HintBoard,
    /// Hint panel shows its typing indicator
    pub hints_typing: bool,
    /// Live analysis scores for the current answer
    pub live_scores: LiveScores,
    /// Overall performance metrics
    pub performance: PerformanceMetrics,
    /// Feedback for the last answer, once analysed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Vec<String>>,
    /// Current notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl SequencerState {
    /// Returns `true` once a session has started and is not ended.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.session_active && self.phase != Phase::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_labels_are_unique() {
        let mut labels: Vec<_> = Phase::ALL.iter().map(|p| p.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), Phase::ALL.len());
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&Phase::PausedAfterQuestion).unwrap();
        assert_eq!(json, "\"paused_after_question\"");
    }

    #[test]
    fn generation_next_increments() {
        let g = Generation::default();
        assert_eq!(g.get(), 0);
        assert_eq!(g.next().next().get(), 2);
    }

    #[test]
    fn default_state_is_not_running() {
        assert!(!SequencerState::default().is_running());
    }
}
