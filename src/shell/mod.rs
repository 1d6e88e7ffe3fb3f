//! Presentation shell
//!
//! Toggles around the dialogue (mic, camera, panels) and the text
//! renderer that turns a sequencer snapshot into a terminal frame.

pub mod render;
pub mod state;

pub use render::{format_elapsed, render};
pub use state::{NOTES_SAVED_NOTICE, NOTES_SAVED_TTL, ShellState, Toggle};
