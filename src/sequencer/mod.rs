//! Dialogue sequencer
//!
//! Replays a scripted question/answer exchange as a timer-driven state
//! machine over an injectable clock.

pub mod engine;
pub mod hints;
pub mod reveal;
pub mod state;
pub mod timers;

pub use engine::{AdvanceMode, Sequencer};
pub use hints::{HintBoard, HintCategory};
pub use reveal::RevealPlan;
pub use state::{Generation, Notice, NoticeKind, Phase, SequencerState};
