//! Structured session event stream.
//!
//! Discrete, typed events emitted while a session runs. Events are
//! serialized as newline-delimited JSON (JSONL) and carry a monotonically
//! increasing sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sequencer::{NoticeKind, Phase};

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The user ended the session.
    Ended,
    /// The configured session time limit was reached.
    TimeLimit,
    /// The command input closed.
    InputClosed,
    /// Interrupted by a shutdown signal.
    Interrupted,
    /// The virtual-time horizon of a simulation was reached.
    Horizon,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Ended => "ended",
            Self::TimeLimit => "time limit reached",
            Self::InputClosed => "input closed",
            Self::Interrupted => "interrupted",
            Self::Horizon => "simulation horizon reached",
        };
        f.write_str(text)
    }
}

/// End-of-session statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    /// Turns played to completion.
    pub turns_completed: u64,
    /// Phase transitions observed.
    pub phase_transitions: u64,
    /// Notices raised.
    pub notices: u64,
    /// Timers discarded as stale.
    pub stale_timers: u64,
    /// Unpaused running time in milliseconds.
    pub elapsed_ms: u64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "turns={} transitions={} notices={} stale_timers={} elapsed={:.1}s",
            self.turns_completed,
            self.phase_transitions,
            self.notices,
            self.stale_timers,
            Duration::from_millis(self.elapsed_ms).as_secs_f64(),
        )
    }
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a session.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The session has started.
    SessionStarted {
        /// When the session started.
        timestamp: DateTime<Utc>,
        /// Random id of this session.
        session_id: String,
        /// Script title.
        title: String,
        /// Interviewer name.
        interviewer: String,
        /// Number of scripted turns.
        turn_count: usize,
    },

    /// A turn began (first turn, or the cycle advanced).
    TurnStarted {
        /// When the turn began.
        timestamp: DateTime<Utc>,
        /// Index of the turn.
        turn_index: usize,
        /// Question text.
        question: String,
    },

    /// The sequencer entered a phase.
    PhaseEntered {
        /// When the transition was observed.
        timestamp: DateTime<Utc>,
        /// Phase entered.
        phase: Phase,
        /// Current turn.
        turn_index: usize,
        /// Virtual time of the transition.
        at_ms: u64,
    },

    /// The user paused the session.
    SessionPaused {
        /// When the session paused.
        timestamp: DateTime<Utc>,
        /// Unpaused running time so far.
        elapsed_ms: u64,
    },

    /// The user resumed the session; the current turn restarts.
    SessionResumed {
        /// When the session resumed.
        timestamp: DateTime<Utc>,
        /// Turn being restarted.
        turn_index: usize,
    },

    /// The user repeated or skipped a turn.
    TurnRestarted {
        /// When the restart happened.
        timestamp: DateTime<Utc>,
        /// Turn now playing.
        turn_index: usize,
        /// `"repeat"` or `"skip"`.
        mode: String,
    },

    /// A notice was raised.
    NoticeRaised {
        /// When the notice appeared.
        timestamp: DateTime<Utc>,
        /// Notice source.
        kind: NoticeKind,
        /// Notice text.
        message: String,
    },

    /// The session is over.
    SessionEnded {
        /// When the session ended.
        timestamp: DateTime<Utc>,
        /// Why it ended.
        reason: StopReason,
        /// Run statistics.
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<RunSummary>,
    },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization and I/O failures are dropped; a broken event sink never
/// interrupts the session.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that discards every event.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter writing to a new file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn phase_event() -> Event {
        Event::PhaseEntered {
            timestamp: DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            phase: Phase::AwaitingAnswer,
            turn_index: 2,
            at_ms: 8_300,
        }
    }

    #[test]
    fn emitter_writes_flat_jsonl() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(phase_event());

        let parsed: serde_json::Value = serde_json::from_str(tw.contents().trim()).unwrap();
        assert_eq!(parsed["sequence"], 0);
        assert_eq!(parsed["type"], "PhaseEntered");
        assert_eq!(parsed["phase"], "awaiting_answer");
        assert_eq!(parsed["at_ms"], 8_300);
        assert!(parsed.get("event").is_none());
    }

    #[test]
    fn emitter_increments_sequence() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(phase_event());
        emitter.emit(Event::SessionEnded {
            timestamp: Utc::now(),
            reason: StopReason::Ended,
            summary: Some(RunSummary {
                turns_completed: 3,
                ..RunSummary::default()
            }),
        });

        assert_eq!(emitter.event_count(), 2);
        let lines: Vec<serde_json::Value> = tw
            .contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["reason"], "ended");
        assert_eq!(lines[1]["summary"]["turns_completed"], 3);
    }

    #[test]
    fn notice_kind_serializes_snake_case() {
        let json = serde_json::to_value(Event::NoticeRaised {
            timestamp: Utc::now(),
            kind: NoticeKind::MediaDenied,
            message: "denied".to_owned(),
        })
        .unwrap();
        assert_eq!(json["kind"], "media_denied");
    }

    #[test]
    fn summary_display() {
        let summary = RunSummary {
            turns_completed: 2,
            phase_transitions: 9,
            notices: 1,
            stale_timers: 4,
            elapsed_ms: 1_500,
        };
        assert_eq!(
            summary.to_string(),
            "turns=2 transitions=9 notices=1 stale_timers=4 elapsed=1.5s"
        );
    }
}
