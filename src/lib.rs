//! Interview Sensei
//!
//! Replays a scripted mock interview in a terminal: the interviewer's
//! question and the candidate's model answer are revealed word by word on
//! a timer-driven state machine, with typed hints, cosmetic live analysis
//! and feedback around them.
//!
//! The [`sequencer`] is synchronous and clock-agnostic; [`runtime`] drives
//! it against tokio time and the [`cli`] wires everything to a terminal.

pub mod analysis;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod media;
pub mod observability;
pub mod runtime;
pub mod scripts;
pub mod sequencer;
pub mod shell;
