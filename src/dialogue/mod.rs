//! Dialogue - activation, sessions and the turn-taking loop
//!
//! - activation.rs: hotkey and wake-word sources, raced against each other
//! - session.rs: one activation-to-termination dialogue
//! - engine.rs: the `DialogueLoop` state machine

mod activation;
mod engine;
mod session;

pub use activation::{
    contains_wake_word, wait_for_activation, Activation, ActivationSource, TerminalHotkey,
    WakeWordListener,
};
pub use engine::{
    greeting, is_termination, DialogueConfig, DialogueLoop, DialogueState, TurnOutcome,
    CAPACITY_APOLOGY, GREETINGS, TERMINATION_PHRASES, TRANSCRIPTION_RETRY_DELAY,
};
pub use session::{Session, Speaker, Turn};
