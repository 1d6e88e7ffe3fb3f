//! Virtual-time timer queue
//!
//! A min-heap of pending actions keyed by `(deadline, sequence)`. The
//! sequence number breaks deadline ties in scheduling order. Each entry
//! carries the generation it was scheduled under; entries whose
//! generation is no longer current are discarded lazily when they reach
//! the head of the queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::observability::metrics;

use super::hints::HintCategory;
use super::state::{Generation, Phase};

/// Work a timer performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Transition into a phase
    EnterPhase(Phase),
    /// Show the first `k` question tokens
    RevealQuestion(usize),
    /// Show the first `k` answer tokens
    RevealAnswer(usize),
    /// Show the first `chars` characters of a hint item
    RevealHint {
        /// Hint category
        category: HintCategory,
        /// Item index within the category
        item: usize,
        /// Number of characters revealed
        chars: usize,
    },
    /// Switch the hint typing indicator
    HintsTyping(bool),
    /// Live analysis tick number `n` (1-based)
    AnalysisTick(u32),
    /// Show post-answer feedback
    ShowFeedback,
    /// Clear the notice with this id
    ClearNotice(u64),
    /// Advance to the next turn
    NextTurn,
    /// Session reached its time limit
    SessionLimit,
}

impl Action {
    /// Short name for log output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::EnterPhase(_) => "enter_phase",
            Self::RevealQuestion(_) => "reveal_question",
            Self::RevealAnswer(_) => "reveal_answer",
            Self::RevealHint { .. } => "reveal_hint",
            Self::HintsTyping(_) => "hints_typing",
            Self::AnalysisTick(_) => "analysis_tick",
            Self::ShowFeedback => "show_feedback",
            Self::ClearNotice(_) => "clear_notice",
            Self::NextTurn => "next_turn",
            Self::SessionLimit => "session_limit",
        }
    }
}

/// A scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    /// Virtual time at which the action fires
    pub deadline_ms: u64,
    /// Scheduling order, unique per queue
    pub seq: u64,
    /// Generation the timer belongs to
    pub generation: Generation,
    /// What to do
    pub action: Action,
}

// Reversed so that `BinaryHeap` pops the earliest deadline first.
impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline_ms
            .cmp(&self.deadline_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending timers for one sequencer.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Timer>,
    next_seq: u64,
    stale_discarded: u64,
}

impl TimerQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` at `deadline_ms` under `generation`.
    pub fn schedule(&mut self, deadline_ms: u64, generation: Generation, action: Action) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Timer {
            deadline_ms,
            seq,
            generation,
            action,
        });
    }

    /// Pops the earliest live timer due at or before `now_ms`.
    ///
    /// Stale timers met on the way are dropped.
    pub fn pop_due(&mut self, now_ms: u64, current: Generation) -> Option<Timer> {
        self.purge_stale(current);
        if self.heap.peek().is_some_and(|t| t.deadline_ms <= now_ms) {
            self.heap.pop()
        } else {
            None
        }
    }

    /// Earliest live deadline, dropping stale entries at the head.
    pub fn next_deadline(&mut self, current: Generation) -> Option<u64> {
        self.purge_stale(current);
        self.heap.peek().map(|t| t.deadline_ms)
    }

    fn purge_stale(&mut self, current: Generation) {
        while let Some(head) = self.heap.peek() {
            if head.generation == current {
                break;
            }
            debug!(
                action = head.action.name(),
                deadline_ms = head.deadline_ms,
                timer_generation = head.generation.get(),
                current_generation = current.get(),
                "discarding stale timer"
            );
            self.heap.pop();
            self.stale_discarded += 1;
            metrics::record_stale_timer();
        }
    }

    /// Number of entries stamped with `current`.
    #[must_use]
    pub fn live_len(&self, current: Generation) -> usize {
        self.heap.iter().filter(|t| t.generation == current).count()
    }

    /// Total number of timers ever scheduled.
    #[must_use]
    pub const fn scheduled_total(&self) -> u64 {
        self.next_seq
    }

    /// Number of stale timers discarded so far.
    #[must_use]
    pub const fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
