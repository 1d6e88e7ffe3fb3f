//! Dialogue sequencer
//!
//! The [`Sequencer`] replays a scripted interview as a finite-state machine
//! over a virtual clock. Every reveal step and phase transition is a timer
//! in a [`TimerQueue`]; the handler that enters a phase schedules exactly
//! the work of that phase plus the transition into the next one.
//!
//! Cancellation is uniform: pausing, resuming, stopping, advancing, ending
//! the session and starting a new turn all bump the [`Generation`], and
//! timers from an older generation are discarded when they surface.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::analysis::{LiveScores, MetricsWalk, feedback_for};
use crate::clock::Clock;
use crate::config::schema::{ScriptConfig, TurnHints};
use crate::observability::metrics;

use super::hints::{self, HintBoard};
use super::reveal::{RevealPlan, duration_ms};
use super::state::{Notice, NoticeKind, Phase, SequencerState};
use super::timers::{Action, Timer, TimerQueue};

/// Answers longer than this many characters get feedback.
pub const FEEDBACK_MIN_ANSWER_CHARS: usize = 20;

/// Shortest possible turn, so a script with all-zero timings still lets
/// virtual time move forward between turns.
const MIN_TURN_MS: u64 = 1;

/// Notice shown once post-answer analysis "completes".
pub const ANALYSIS_NOTICE: &str = "Answer analysis complete. Overall: Strong response!";

/// Notice shown when the user ends the session.
pub const SESSION_ENDED_NOTICE: &str = "Interview session ended.";

/// Notice shown when the session time limit is reached.
pub const SESSION_LIMIT_NOTICE: &str = "Session time limit reached.";

/// Which turn `advance` restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceMode {
    /// Restart the current turn
    Repeat,
    /// Move on to the next turn
    Skip,
}

impl AdvanceMode {
    /// Lower-case name, used in events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Repeat => "repeat",
            Self::Skip => "skip",
        }
    }
}

/// Finite-state machine driving one interview session.
///
/// Every operation returns the state snapshots it produced, one per
/// mutation, in order. An empty vector means the call was a no-op.
#[derive(Debug)]
pub struct Sequencer<C: Clock> {
    clock: C,
    script: Option<Arc<ScriptConfig>>,
    state: SequencerState,
    timers: TimerQueue,
    walk: MetricsWalk,
    question: RevealPlan,
    answer: RevealPlan,
    answer_chars: usize,
    turn_hints: TurnHints,
    turn_started_ms: u64,
    elapsed_before_ms: u64,
    running_since_ms: Option<u64>,
    next_notice_id: u64,
    transitions: u64,
    notices: u64,
}

impl<C: Clock> Sequencer<C> {
    /// Creates an idle sequencer reading time from `clock`.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            script: None,
            state: SequencerState::default(),
            timers: TimerQueue::new(),
            walk: MetricsWalk::default(),
            question: RevealPlan::new("", Duration::ZERO),
            answer: RevealPlan::new("", Duration::ZERO),
            answer_chars: 0,
            turn_hints: TurnHints::default(),
            turn_started_ms: 0,
            elapsed_before_ms: 0,
            running_since_ms: None,
            next_notice_id: 0,
            transitions: 0,
            notices: 0,
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Starts the session at turn 0.
    ///
    /// No-op while a session is running or paused, and after the session
    /// has been ended. With an empty turn list the sequencer stays idle and
    /// schedules nothing.
    pub fn start(&mut self, script: Arc<ScriptConfig>) -> Vec<SequencerState> {
        if self.is_ended() {
            debug!("start ignored: session already ended");
            return Vec::new();
        }
        if self.state.phase != Phase::Idle || self.state.is_paused {
            debug!(phase = %self.state.phase, "start ignored: session already running");
            return Vec::new();
        }

        let turn_count = script.turns.len();
        self.walk = MetricsWalk::new(script.analysis.seed);
        self.state = SequencerState {
            turn_count,
            generation: self.state.generation,
            notice: self.state.notice.take(),
            ..SequencerState::default()
        };
        self.script = Some(script);
        self.elapsed_before_ms = 0;

        if turn_count == 0 {
            warn!("script has no turns; sequencer stays idle");
            return Vec::new();
        }

        let now = self.clock.now_ms();
        self.state.session_active = true;
        self.running_since_ms = Some(now);
        info!(turn_count, "session started");

        let mut out = Vec::new();
        self.enter_turn(0, now);
        out.push(self.snapshot(now));
        self.run_due(now, &mut out);
        out
    }

    /// Pauses the session, freezing the visible state.
    pub fn pause(&mut self) -> Vec<SequencerState> {
        if !self.state.is_running() || self.state.is_paused {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.accumulate_elapsed(now);
        self.bump_generation();
        self.state.is_paused = true;
        info!(
            turn = self.state.turn_index,
            phase = %self.state.phase,
            elapsed_ms = self.elapsed_before_ms,
            "session paused"
        );
        vec![self.snapshot(now)]
    }

    /// Resumes a paused session by restarting the current turn.
    pub fn resume(&mut self) -> Vec<SequencerState> {
        if !self.state.is_paused || !self.state.session_active {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.running_since_ms = Some(now);
        info!(turn = self.state.turn_index, "session resumed");

        let mut out = Vec::new();
        self.enter_turn(self.state.turn_index, now);
        out.push(self.snapshot(now));
        self.run_due(now, &mut out);
        out
    }

    /// Cancels all pending work and returns to idle.
    pub fn stop(&mut self) -> Vec<SequencerState> {
        if self.state.phase == Phase::Idle {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.accumulate_elapsed(now);
        self.bump_generation();
        self.timers.clear();
        self.state.is_paused = false;
        self.set_phase(Phase::Idle, now);
        self.state.revealed_question.clear();
        self.state.revealed_answer.clear();
        self.state.hints_typing = false;
        info!("session stopped");
        vec![self.snapshot(now)]
    }

    /// Ends the session for good, with a notice.
    pub fn end_session(&mut self) -> Vec<SequencerState> {
        if !self.state.session_active {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.finish(now, NoticeKind::SessionEnded, SESSION_ENDED_NOTICE);
        vec![self.snapshot(now)]
    }

    /// Restarts the current turn or skips to the next one.
    ///
    /// A paused session is resumed by the restart.
    pub fn advance(&mut self, mode: AdvanceMode) -> Vec<SequencerState> {
        if !self.state.is_running() || self.state.turn_count == 0 {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        if self.state.is_paused {
            self.running_since_ms = Some(now);
        }
        let index = match mode {
            AdvanceMode::Repeat => self.state.turn_index,
            AdvanceMode::Skip => (self.state.turn_index + 1) % self.state.turn_count,
        };
        info!(mode = mode.label(), turn = index, "turn restarted");

        let mut out = Vec::new();
        self.enter_turn(index, now);
        out.push(self.snapshot(now));
        self.run_due(now, &mut out);
        out
    }

    /// Fires every live timer that is due at the clock's current time.
    pub fn poll(&mut self) -> Vec<SequencerState> {
        let now = self.clock.now_ms();
        let mut out = Vec::new();
        self.run_due(now, &mut out);
        out
    }

    /// Shows a notice, optionally clearing it after `duration`.
    ///
    /// While paused or stopped no expiry timer runs; the expiry is re-armed
    /// when the next turn starts.
    pub fn raise_notice(
        &mut self,
        kind: NoticeKind,
        message: impl Into<String>,
        duration: Option<Duration>,
    ) -> Vec<SequencerState> {
        let now = self.clock.now_ms();
        self.set_notice(kind, message.into(), duration, now);
        vec![self.snapshot(now)]
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Earliest live timer deadline, if any.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.timers.next_deadline(self.state.generation)
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SequencerState {
        &self.state
    }

    /// Script the session was started with.
    #[must_use]
    pub const fn script(&self) -> Option<&Arc<ScriptConfig>> {
        self.script.as_ref()
    }

    /// The clock driving this sequencer.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Unpaused running time at the clock's current time.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_at(self.clock.now_ms())
    }

    /// Returns `true` once the session has been ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.script.is_some() && !self.state.session_active && self.state.turn_count > 0
    }

    /// Number of phase transitions so far.
    #[must_use]
    pub const fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Number of notices raised so far.
    #[must_use]
    pub const fn notices(&self) -> u64 {
        self.notices
    }

    /// Number of stale timers discarded so far.
    #[must_use]
    pub const fn stale_timers(&self) -> u64 {
        self.timers.stale_discarded()
    }

    /// Number of pending timers of the current generation.
    #[must_use]
    pub fn live_timers(&self) -> usize {
        self.timers.live_len(self.state.generation)
    }

    /// Total number of timers ever scheduled.
    #[must_use]
    pub const fn scheduled_timers(&self) -> u64 {
        self.timers.scheduled_total()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn run_due(&mut self, now: u64, out: &mut Vec<SequencerState>) {
        while let Some(timer) = self.timers.pop_due(now, self.state.generation) {
            let at = timer.deadline_ms;
            if self.dispatch(timer) {
                out.push(self.snapshot(at));
            }
        }
    }

    /// Applies one timer. Returns `true` if the state changed.
    fn dispatch(&mut self, timer: Timer) -> bool {
        if timer.generation != self.state.generation {
            return false;
        }
        if self.state.is_paused || !self.state.session_active {
            return false;
        }
        let at = timer.deadline_ms;
        debug!(action = timer.action.name(), at_ms = at, "timer fired");

        match timer.action {
            Action::EnterPhase(phase) => {
                self.set_phase(phase, at);
                self.on_enter(phase, at);
                true
            }
            Action::RevealQuestion(k) => {
                self.state.phase == Phase::AskingQuestion
                    && replace(&mut self.state.revealed_question, self.question.prefix(k))
            }
            Action::RevealAnswer(k) => {
                self.state.phase == Phase::AwaitingAnswer
                    && replace(&mut self.state.revealed_answer, self.answer.prefix(k))
            }
            Action::RevealHint {
                category,
                item,
                chars,
            } => self
                .state
                .hints
                .reveal(&self.turn_hints, category, item, chars),
            Action::HintsTyping(on) => {
                let changed = self.state.hints_typing != on;
                self.state.hints_typing = on;
                changed
            }
            Action::AnalysisTick(tick) => {
                if self.state.phase != Phase::AwaitingAnswer {
                    return false;
                }
                self.walk.step(
                    self.state.turn_index as u64,
                    tick,
                    &mut self.state.live_scores,
                    &mut self.state.performance,
                );
                true
            }
            Action::ShowFeedback => {
                if self.state.phase != Phase::PausedAfterAnswer {
                    return false;
                }
                self.state.feedback = self
                    .script
                    .as_deref()
                    .and_then(|s| feedback_for(s, self.state.turn_index));
                let ttl = self
                    .script
                    .as_ref()
                    .map(|s| s.analysis.notice_duration);
                self.set_notice(NoticeKind::Analysis, ANALYSIS_NOTICE.to_owned(), ttl, at);
                true
            }
            Action::ClearNotice(id) => {
                if self.state.notice.as_ref().is_some_and(|n| n.id == id) {
                    self.state.notice = None;
                    true
                } else {
                    false
                }
            }
            Action::NextTurn => {
                self.state.turns_completed += 1;
                metrics::record_turn_completed();
                let next = (self.state.turn_index + 1) % self.state.turn_count.max(1);
                self.enter_turn(next, at);
                true
            }
            Action::SessionLimit => {
                self.finish(at, NoticeKind::SessionLimit, SESSION_LIMIT_NOTICE);
                true
            }
        }
    }

    /// Resets per-turn state and enters `AskingQuestion` for turn `index`.
    fn enter_turn(&mut self, index: usize, at: u64) {
        let Some(script) = self.script.clone() else {
            return;
        };
        let Some(turn) = script.turn(index) else {
            return;
        };
        let timing = &script.timing;

        self.bump_generation();
        self.state.turn_index = index % script.turns.len();
        self.state.is_paused = false;
        self.state.revealed_question.clear();
        self.state.revealed_answer.clear();
        self.state.hints = HintBoard::blank_for(&turn.hints);
        self.state.hints_typing = false;
        self.state.live_scores = LiveScores::default();
        self.state.feedback = None;

        self.question = RevealPlan::new(&turn.question, timing.question_reveal);
        self.answer = RevealPlan::new(&turn.answer, timing.answer_reveal);
        self.answer_chars = self.answer.full_text().chars().count();
        self.turn_hints.clone_from(&turn.hints);
        self.turn_started_ms = at;

        info!(
            turn = self.state.turn_index,
            of = self.state.turn_count,
            generation = self.state.generation.get(),
            "turn started"
        );

        // No transition is recorded when repeating from AskingQuestion.
        self.set_phase(Phase::AskingQuestion, at);
        self.on_enter(Phase::AskingQuestion, at);
        self.schedule_hints(at);
        self.arm_session_limit(at);
        self.arm_notice_expiry(at);
    }

    /// Transition table: the work of `phase` and the step into the next one.
    fn on_enter(&mut self, phase: Phase, at: u64) {
        let Some(script) = self.script.clone() else {
            return;
        };
        let timing = &script.timing;
        let generation = self.state.generation;

        match phase {
            Phase::Idle => {}
            Phase::AskingQuestion => {
                for (k, offset) in self.question.steps() {
                    self.timers
                        .schedule(at.saturating_add(offset), generation, Action::RevealQuestion(k));
                }
                self.timers.schedule(
                    at.saturating_add(self.question.duration_ms()),
                    generation,
                    Action::EnterPhase(Phase::PausedAfterQuestion),
                );
            }
            Phase::PausedAfterQuestion => {
                self.timers.schedule(
                    at.saturating_add(duration_ms(timing.after_question)),
                    generation,
                    Action::EnterPhase(Phase::AwaitingAnswer),
                );
            }
            Phase::AwaitingAnswer => {
                for (k, offset) in self.answer.steps() {
                    self.timers
                        .schedule(at.saturating_add(offset), generation, Action::RevealAnswer(k));
                }
                let interval = duration_ms(script.analysis.interval);
                if interval > 0 {
                    let mut tick = 1u32;
                    while interval.saturating_mul(u64::from(tick)) < self.answer.duration_ms() {
                        self.timers.schedule(
                            at.saturating_add(interval.saturating_mul(u64::from(tick))),
                            generation,
                            Action::AnalysisTick(tick),
                        );
                        tick += 1;
                    }
                }
                self.timers.schedule(
                    at.saturating_add(self.answer.duration_ms()),
                    generation,
                    Action::EnterPhase(Phase::PausedAfterAnswer),
                );
            }
            Phase::PausedAfterAnswer => {
                if self.answer_chars > FEEDBACK_MIN_ANSWER_CHARS {
                    self.timers.schedule(
                        at.saturating_add(duration_ms(script.analysis.feedback_delay)),
                        generation,
                        Action::ShowFeedback,
                    );
                }
                let next = at
                    .saturating_add(duration_ms(timing.after_answer))
                    .max(self.turn_started_ms.saturating_add(MIN_TURN_MS));
                self.timers.schedule(next, generation, Action::NextTurn);
            }
        }
    }

    fn schedule_hints(&mut self, at: u64) {
        let Some(script) = self.script.clone() else {
            return;
        };
        let timing = &script.timing;
        let Some(start) = timing.hints_start else {
            return;
        };
        if self.turn_hints.is_empty() {
            return;
        }
        let generation = self.state.generation;
        let base = at.saturating_add(duration_ms(start));

        self.timers
            .schedule(base, generation, Action::HintsTyping(true));
        for step in hints::plan(
            &self.turn_hints,
            timing.hint_char_delay,
            timing.hint_category_stagger,
        ) {
            self.timers.schedule(
                base.saturating_add(step.offset_ms),
                generation,
                Action::RevealHint {
                    category: step.category,
                    item: step.item,
                    chars: step.chars,
                },
            );
        }
        self.timers.schedule(
            base.saturating_add(duration_ms(timing.hints_typing_window)),
            generation,
            Action::HintsTyping(false),
        );
    }

    fn arm_session_limit(&mut self, at: u64) {
        let Some(limit) = self.script.as_ref().and_then(|s| s.session.max_duration) else {
            return;
        };
        let remaining = duration_ms(limit).saturating_sub(self.elapsed_at(at));
        self.timers
            .schedule(
                at.saturating_add(remaining),
                self.state.generation,
                Action::SessionLimit,
            );
    }

    fn arm_notice_expiry(&mut self, at: u64) {
        let Some((id, expires)) = self
            .state
            .notice
            .as_ref()
            .and_then(|n| n.expires_at_ms.map(|e| (n.id, e)))
        else {
            return;
        };
        self.timers.schedule(
            expires.max(at),
            self.state.generation,
            Action::ClearNotice(id),
        );
    }

    fn set_notice(&mut self, kind: NoticeKind, message: String, ttl: Option<Duration>, at: u64) {
        let id = self.next_notice_id;
        self.next_notice_id += 1;
        let expires_at_ms = ttl.map(|d| at.saturating_add(duration_ms(d)));
        info!(kind = kind.label(), %message, "notice raised");
        self.state.notice = Some(Notice {
            id,
            message,
            kind,
            raised_at_ms: at,
            expires_at_ms,
        });
        self.notices += 1;
        metrics::record_notice(kind);

        if let Some(expires) = expires_at_ms
            && self.state.is_running()
            && !self.state.is_paused
        {
            self.timers
                .schedule(expires, self.state.generation, Action::ClearNotice(id));
        }
    }

    fn finish(&mut self, at: u64, kind: NoticeKind, message: &str) {
        self.accumulate_elapsed(at);
        self.bump_generation();
        self.timers.clear();
        self.state.is_paused = false;
        self.set_phase(Phase::Idle, at);
        self.state.session_active = false;
        self.state.hints_typing = false;
        self.set_notice(kind, message.to_owned(), None, at);
        info!(
            turns_completed = self.state.turns_completed,
            elapsed_ms = self.elapsed_before_ms,
            "session ended"
        );
    }

    fn set_phase(&mut self, phase: Phase, at: u64) {
        let previous = self.state.phase;
        if previous == phase {
            return;
        }
        self.state.phase = phase;
        self.state.interviewer_speaking = phase == Phase::AskingQuestion;
        self.state.candidate_speaking = phase == Phase::AwaitingAnswer;
        self.transitions += 1;
        metrics::record_phase_transition(previous, phase);
        metrics::set_current_phase(phase, Some(previous));
        info!(
            from = %previous,
            to = %phase,
            turn = self.state.turn_index,
            at_ms = at,
            "phase transition"
        );
    }

    fn bump_generation(&mut self) {
        self.state.generation = self.state.generation.next();
    }

    fn accumulate_elapsed(&mut self, now: u64) {
        if let Some(since) = self.running_since_ms.take() {
            self.elapsed_before_ms = self
                .elapsed_before_ms
                .saturating_add(now.saturating_sub(since));
        }
    }

    fn elapsed_at(&self, at: u64) -> u64 {
        self.elapsed_before_ms.saturating_add(
            self.running_since_ms
                .map_or(0, |since| at.saturating_sub(since)),
        )
    }

    fn snapshot(&mut self, at: u64) -> SequencerState {
        self.state.updated_at_ms = at;
        self.state.elapsed_ms = self.elapsed_at(at);
        self.state.clone()
    }
}

/// Replaces `slot` with `value`, returning whether it changed.
fn replace(slot: &mut String, value: String) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
