use std::time::Duration;

use crate::feedback::LetterState;
use crate::session::SessionStatus;

/// User-facing text. `auto_clear: None` keeps it until replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub auto_clear: Option<Duration>,
}

impl Message {
    /// A zero delay means the message is never cleared.
    pub fn transient(text: impl Into<String>, after: Duration) -> Self {
        Self {
            text: text.into(),
            auto_clear: (!after.is_zero()).then_some(after),
        }
    }

    pub fn sticky(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            auto_clear: None,
        }
    }
}

/// State changes for the renderer, emitted in the order they happen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderEvent {
    /// A slot changed. `state` is set only when the row is painted.
    Tile {
        row: usize,
        col: usize,
        letter: Option<char>,
        state: Option<LetterState>,
    },
    Key {
        letter: char,
        state: LetterState,
    },
    Message(Message),
    Outcome {
        status: SessionStatus,
        answer: Option<String>,
    },
}
