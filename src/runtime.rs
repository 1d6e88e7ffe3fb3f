//! Async session runtime
//!
//! Drives a [`Sequencer`] in real (or sped-up) time. The loop sleeps until
//! the next live timer deadline, polls the sequencer, and interleaves user
//! commands arriving on an mpsc channel. Every change is published as a
//! [`SessionView`] on a watch channel for the renderer.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::TokioClock;
use crate::config::schema::ScriptConfig;
use crate::error::{Result, SessionError};
use crate::media::MediaDevices;
use crate::observability::{Event, EventEmitter, RunSummary, StopReason};
use crate::sequencer::{AdvanceMode, NoticeKind, Sequencer, SequencerState};
use crate::shell::{NOTES_SAVED_NOTICE, NOTES_SAVED_TTL, ShellState, Toggle};

/// Notice shown when the camera cannot be opened.
pub const CAMERA_DENIED_NOTICE: &str = "Camera access denied. Continuing without video.";

/// Help text for the interactive command line.
pub const COMMAND_HELP: &str = "\
commands:
  b, start      start (or restart after stop)
  p, pause      pause
  r, resume     resume (restarts the current turn)
  a, again      repeat the current turn
  s, skip       skip to the next turn
  x, stop       stop and return to idle
  e, end        end the session
  m, mic        toggle microphone
  v, video      toggle camera
  k, record     toggle recording
  c, sidebar    collapse or expand the sidebar
  h, hints      toggle hints
  d, analytics  toggle analytics
  o, notes      toggle the notes panel
  t, theme      toggle dark mode
  g, settings   toggle settings
  f, read       mark feedback as read
  n <text>      save notes
  q, quit       end the session and exit";

/// A user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start the session (after a stop, restarts at the first turn)
    Start,
    /// Pause and freeze the visible state
    Pause,
    /// Resume by restarting the current turn
    Resume,
    /// Cancel pending work and go idle
    Stop,
    /// Repeat the current turn or skip to the next
    Advance(AdvanceMode),
    /// End the session for good
    End,
    /// Flip a shell toggle
    Toggle(Toggle),
    /// Store notes in memory
    SaveNotes(String),
    /// Clear the unread-feedback marker
    MarkRead,
    /// End the session and stop the run
    Quit,
}

impl FromStr for SessionCommand {
    type Err = SessionError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "b" | "start" => Self::Start,
            "p" | "pause" => Self::Pause,
            "r" | "resume" => Self::Resume,
            "a" | "again" | "repeat" => Self::Advance(AdvanceMode::Repeat),
            "s" | "skip" | "next" => Self::Advance(AdvanceMode::Skip),
            "x" | "stop" => Self::Stop,
            "e" | "end" => Self::End,
            "m" | "mic" => Self::Toggle(Toggle::Mic),
            "v" | "video" => Self::Toggle(Toggle::Video),
            "k" | "record" => Self::Toggle(Toggle::Recording),
            "c" | "sidebar" => Self::Toggle(Toggle::Sidebar),
            "h" | "hints" => Self::Toggle(Toggle::Hints),
            "d" | "analytics" => Self::Toggle(Toggle::Analytics),
            "o" | "notes" => Self::Toggle(Toggle::Notes),
            "t" | "theme" => Self::Toggle(Toggle::DarkMode),
            "g" | "settings" => Self::Toggle(Toggle::Settings),
            "f" | "read" => Self::MarkRead,
            "n" | "note" if !rest.is_empty() => Self::SaveNotes(rest.to_string()),
            "q" | "quit" | "exit" => Self::Quit,
            _ => return Err(SessionError::UnknownCommand(line.to_string())),
        };
        Ok(command)
    }
}

/// What the renderer sees.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    /// Latest sequencer snapshot
    pub state: SequencerState,
    /// Shell toggles
    pub shell: ShellState,
}

/// Owns a sequencer and runs it against tokio time.
pub struct SessionRuntime {
    sequencer: Sequencer<TokioClock>,
    script: Arc<ScriptConfig>,
    shell: ShellState,
    media: Arc<dyn MediaDevices>,
    events: Arc<EventEmitter>,
    cancel: CancellationToken,
    view_tx: watch::Sender<SessionView>,
    last: SequencerState,
}

impl std::fmt::Debug for SessionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRuntime")
            .field("phase", &self.last.phase)
            .field("turn_index", &self.last.turn_index)
            .finish_non_exhaustive()
    }
}

impl SessionRuntime {
    /// Creates a runtime for `script`.
    #[must_use]
    pub fn new(
        sequencer: Sequencer<TokioClock>,
        script: Arc<ScriptConfig>,
        media: Arc<dyn MediaDevices>,
        events: Arc<EventEmitter>,
        cancel: CancellationToken,
    ) -> Self {
        let shell = ShellState::new(script.session.auto_record);
        let (view_tx, _) = watch::channel(SessionView {
            state: sequencer.state().clone(),
            shell: shell.clone(),
        });
        Self {
            last: sequencer.state().clone(),
            sequencer,
            script,
            shell,
            media,
            events,
            cancel,
            view_tx,
        }
    }

    /// Subscribes to published views.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    /// Runs the session until it ends, input closes or the token is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyEnded`] if the sequencer was ended
    /// before the run started.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) -> Result<(RunSummary, StopReason)> {
        if self.sequencer.is_ended() {
            return Err(SessionError::AlreadyEnded.into());
        }

        let persona = self.script.session.persona.profile();
        self.events.emit(Event::SessionStarted {
            timestamp: Utc::now(),
            session_id: uuid::Uuid::new_v4().to_string(),
            title: self.script.session.title.clone(),
            interviewer: persona.name.to_string(),
            turn_count: self.script.turns.len(),
        });

        let out = self.sequencer.start(Arc::clone(&self.script));
        self.publish(out);

        let reason = loop {
            if self.sequencer.is_ended() {
                break self.end_reason();
            }

            let deadline = self
                .sequencer
                .next_deadline()
                .map(|ms| self.sequencer.clock().instant_at(ms));

            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("session cancelled");
                    break StopReason::Interrupted;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("command channel closed");
                        break StopReason::InputClosed;
                    };
                    if command == SessionCommand::Quit {
                        let out = self.sequencer.end_session();
                        self.publish(out);
                        break StopReason::Ended;
                    }
                    self.handle(command).await;
                }
                () = sleep_until(deadline) => {
                    let out = self.sequencer.poll();
                    self.publish(out);
                }
            }
        };

        let summary = self.summary();
        info!(%reason, %summary, "session finished");
        self.events.emit(Event::SessionEnded {
            timestamp: Utc::now(),
            reason,
            summary: Some(summary.clone()),
        });
        Ok((summary, reason))
    }

    async fn handle(&mut self, command: SessionCommand) {
        debug!(?command, "command received");
        let out = match command {
            SessionCommand::Start => self.sequencer.start(Arc::clone(&self.script)),
            SessionCommand::Pause => {
                let out = self.sequencer.pause();
                if !out.is_empty() {
                    self.events.emit(Event::SessionPaused {
                        timestamp: Utc::now(),
                        elapsed_ms: self.sequencer.elapsed_ms(),
                    });
                }
                out
            }
            SessionCommand::Resume => {
                let out = self.sequencer.resume();
                if !out.is_empty() {
                    self.events.emit(Event::SessionResumed {
                        timestamp: Utc::now(),
                        turn_index: self.sequencer.state().turn_index,
                    });
                }
                out
            }
            SessionCommand::Stop => self.sequencer.stop(),
            SessionCommand::Advance(mode) => {
                let out = self.sequencer.advance(mode);
                if !out.is_empty() {
                    self.events.emit(Event::TurnRestarted {
                        timestamp: Utc::now(),
                        turn_index: self.sequencer.state().turn_index,
                        mode: mode.label().to_string(),
                    });
                }
                out
            }
            SessionCommand::End | SessionCommand::Quit => self.sequencer.end_session(),
            SessionCommand::Toggle(Toggle::Video) => self.toggle_video().await,
            SessionCommand::Toggle(toggle) => {
                let on = self.shell.toggle(toggle);
                info!(toggle = toggle.label(), on, "shell toggled");
                Vec::new()
            }
            SessionCommand::SaveNotes(text) => {
                self.shell.save_notes(text);
                self.sequencer.raise_notice(
                    NoticeKind::NotesSaved,
                    NOTES_SAVED_NOTICE,
                    Some(NOTES_SAVED_TTL),
                )
            }
            SessionCommand::MarkRead => {
                self.shell.mark_read();
                Vec::new()
            }
        };
        self.publish(out);
    }

    async fn toggle_video(&mut self) -> Vec<SequencerState> {
        if !self.shell.toggle(Toggle::Video) {
            info!("camera off");
            return Vec::new();
        }
        match self.media.request_camera().await {
            Ok(()) => {
                info!("camera on");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "camera unavailable");
                self.shell.set(Toggle::Video, false);
                self.sequencer.raise_notice(
                    NoticeKind::MediaDenied,
                    CAMERA_DENIED_NOTICE,
                    Some(self.script.analysis.notice_duration),
                )
            }
        }
    }

    /// Emits events for each snapshot and publishes the latest view.
    fn publish(&mut self, snapshots: Vec<SequencerState>) {
        for state in snapshots {
            self.diff_events(&state);
            self.last = state;
        }
        self.view_tx.send_replace(SessionView {
            state: self.last.clone(),
            shell: self.shell.clone(),
        });
    }

    fn diff_events(&mut self, next: &SequencerState) {
        let prev = &self.last;
        let timestamp = Utc::now();

        let turn_began = (next.session_active && !prev.session_active)
            || next.turn_index != prev.turn_index
            || next.turns_completed > prev.turns_completed;
        if turn_began && next.session_active {
            let question = self
                .script
                .turn(next.turn_index)
                .map(|t| t.question.clone())
                .unwrap_or_default();
            self.events.emit(Event::TurnStarted {
                timestamp,
                turn_index: next.turn_index,
                question,
            });
        }

        if next.phase != prev.phase {
            self.events.emit(Event::PhaseEntered {
                timestamp,
                phase: next.phase,
                turn_index: next.turn_index,
                at_ms: next.updated_at_ms,
            });
        }

        if let Some(notice) = &next.notice
            && prev.notice.as_ref().map(|n| n.id) != Some(notice.id)
        {
            self.events.emit(Event::NoticeRaised {
                timestamp,
                kind: notice.kind,
                message: notice.message.clone(),
            });
        }

        if next.feedback.is_some() && prev.feedback.is_none() {
            self.shell.has_unread = true;
        }
    }

    fn end_reason(&self) -> StopReason {
        match self.sequencer.state().notice.as_ref().map(|n| n.kind) {
            Some(NoticeKind::SessionLimit) => StopReason::TimeLimit,
            _ => StopReason::Ended,
        }
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            turns_completed: self.sequencer.state().turns_completed,
            phase_transitions: self.sequencer.transitions(),
            notices: self.sequencer.notices(),
            stale_timers: self.sequencer.stale_timers(),
            elapsed_ms: self.sequencer.elapsed_ms(),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
