use std::collections::HashMap;
use std::time::Duration;

use tracing::{info, warn};

use crate::buffer::{GuessBuffer, Tile};
use crate::events::{Message, RenderEvent};
use crate::feedback::{LetterState, TokenPolicy};
use crate::judge::{Judge, JudgeError, JudgeReply};
use crate::keyboard::KeyboardAggregator;
use crate::submission::{JudgeRequest, Judged, SubmissionController, SubmitError};
use crate::{COLS, ROWS};

pub const MSG_STARTED: &str = "Game started! Type a word...";
pub const MSG_CHECKING: &str = "Checking...";
pub const MSG_INCOMPLETE: &str = "Fill all 5 letters before submitting";
pub const MSG_FAILURE: &str = "Network error or word not in the word list";
pub const MSG_KEEP_GOING: &str = "Keep going!";
pub const MSG_WON: &str = "You got it!";
pub const ANSWER_PLACEHOLDER: &str = "(ask the judge)";

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum SessionStatus {
    InProgress,
    Won,
    Lost,
}

impl SessionStatus {
    pub fn is_over(self) -> bool {
        self != SessionStatus::InProgress
    }
}

/// A normalized key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Letter(char),
    Delete,
    Submit,
}

impl Key {
    /// Accepts a single ASCII letter, `Delete`/`Del`/`Backspace` or
    /// `Submit`/`Enter` (case-insensitive). Anything else is not a game key.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return c
                .is_ascii_alphabetic()
                .then(|| Key::Letter(c.to_ascii_uppercase()));
        }
        match raw.to_ascii_lowercase().as_str() {
            "delete" | "del" | "backspace" => Some(Key::Delete),
            "submit" | "enter" => Some(Key::Submit),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    /// How long transient messages stay up.
    pub message_duration: Duration,
    pub token_policy: TokenPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            message_duration: Duration::from_millis(2000),
            token_policy: TokenPolicy::Lenient,
        }
    }
}

/// One game: the grid, the keyboard colours, the submission lock and the
/// outcome. Construct a new one to play again.
#[derive(Debug)]
pub struct GameSession {
    options: SessionOptions,
    buffer: GuessBuffer,
    keyboard: KeyboardAggregator,
    controller: SubmissionController,
    status: SessionStatus,
    answer: Option<String>,
    message: Option<Message>,
    events: Vec<RenderEvent>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl GameSession {
    pub fn new(options: SessionOptions) -> Self {
        let mut session = Self {
            options,
            buffer: GuessBuffer::new(),
            keyboard: KeyboardAggregator::new(),
            controller: SubmissionController::new(options.token_policy),
            status: SessionStatus::InProgress,
            answer: None,
            message: None,
            events: Vec::new(),
        };
        session.show(Message::transient(MSG_STARTED, options.message_duration));
        session
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.buffer.cursor()
    }

    pub fn grid(&self) -> &[[Tile; COLS]; ROWS] {
        self.buffer.rows()
    }

    pub fn keyboard(&self) -> &HashMap<char, LetterState> {
        self.keyboard.snapshot()
    }

    pub fn key_state(&self, letter: char) -> Option<LetterState> {
        self.keyboard.best_state(letter)
    }

    pub fn is_locked(&self) -> bool {
        self.controller.is_locked()
    }

    /// The answer revealed at the end of the game, if known.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Number of rows the judge has painted.
    pub fn guesses_used(&self) -> usize {
        self.buffer
            .rows()
            .iter()
            .filter(|row| row.iter().all(|t| t.state.is_some()))
            .count()
    }

    pub fn drain_events(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }

    fn accepts_input(&self) -> bool {
        !self.status.is_over() && !self.controller.is_locked()
    }

    fn show(&mut self, message: Message) {
        self.message = Some(message.clone());
        self.events.push(RenderEvent::Message(message));
    }

    fn show_transient(&mut self, text: impl Into<String>) {
        self.show(Message::transient(text, self.options.message_duration));
    }

    /// Routes one key. A returned request must be judged and the reply fed to
    /// [`GameSession::apply_judgement`].
    pub fn handle_key(&mut self, key: Key) -> Option<JudgeRequest> {
        if !self.accepts_input() {
            return None;
        }
        match key {
            Key::Letter(c) => {
                self.insert_letter(c);
                None
            }
            Key::Delete => {
                self.delete_letter();
                None
            }
            Key::Submit => self.begin_submission().ok().flatten(),
        }
    }

    pub fn insert_letter(&mut self, c: char) {
        if !self.accepts_input() || !c.is_ascii_alphabetic() {
            return;
        }
        if let Some((row, col, letter)) = self.buffer.insert_letter(c) {
            self.events.push(RenderEvent::Tile {
                row,
                col,
                letter: Some(letter),
                state: None,
            });
        }
    }

    pub fn delete_letter(&mut self) {
        if !self.accepts_input() {
            return;
        }
        if let Some((row, col)) = self.buffer.delete_letter() {
            self.events.push(RenderEvent::Tile {
                row,
                col,
                letter: None,
                state: None,
            });
        }
    }

    /// Takes the submission lock for the current row.
    ///
    /// `Ok(None)` when ignored (locked or game over); `IncompleteRow` leaves
    /// every piece of state as it was apart from the message.
    pub fn begin_submission(&mut self) -> Result<Option<JudgeRequest>, SubmitError> {
        match self.controller.begin(&self.buffer, self.status.is_over()) {
            Ok(Some(request)) => {
                self.show_transient(MSG_CHECKING);
                Ok(Some(request))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                self.show_transient(MSG_INCOMPLETE);
                Err(err)
            }
        }
    }

    /// Applies the judge's answer to the row that was submitted. Errors leave
    /// the grid and keyboard untouched and the row editable.
    pub fn apply_judgement(
        &mut self,
        reply: Result<JudgeReply, JudgeError>,
    ) -> Result<SessionStatus, SubmitError> {
        match self.controller.finish(reply) {
            Ok(judged) => {
                self.apply(judged);
                Ok(self.status)
            }
            Err(SubmitError::NotAwaiting) => {
                warn!("judge reply arrived with no submission in flight");
                Err(SubmitError::NotAwaiting)
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                match &err {
                    SubmitError::InvalidGuessRejected(text) => self.show_transient(text.clone()),
                    _ => self.show_transient(MSG_FAILURE),
                }
                Err(err)
            }
        }
    }

    /// Submits the current row and waits for the judge.
    ///
    /// If this future is dropped before the judge answers, the lock is released
    /// and the row stays editable.
    pub async fn submit(&mut self, judge: &dyn Judge) -> Result<SessionStatus, SubmitError> {
        let Some(request) = self.begin_submission()? else {
            return Ok(self.status);
        };

        let mut in_flight = AbandonOnDrop {
            controller: Some(&mut self.controller),
        };
        let reply = judge.check(&request.guess).await;
        in_flight.controller = None;
        drop(in_flight);

        self.apply_judgement(reply)
    }

    fn apply(&mut self, judged: Judged) {
        let Judged {
            row,
            letters,
            states,
            win,
            answer,
        } = judged;

        if !self.buffer.paint_row(row, &states) {
            warn!(row, "row already painted, dropping judgement");
            return;
        }
        for (col, (&letter, &state)) in letters.iter().zip(&states).enumerate() {
            self.events.push(RenderEvent::Tile {
                row,
                col,
                letter: Some(letter),
                state: Some(state),
            });
        }

        for (letter, state) in self.keyboard.observe(&letters, &states) {
            self.events.push(RenderEvent::Key { letter, state });
        }

        if win {
            self.status = SessionStatus::Won;
            self.answer = Some(answer.unwrap_or_else(|| letters.iter().collect()));
            info!(row, "session won");
            self.show(Message::sticky(MSG_WON));
        } else if row + 1 == ROWS {
            self.status = SessionStatus::Lost;
            self.answer = answer;
            info!(answer = ?self.answer, "session lost");
            let shown = self.answer.as_deref().unwrap_or(ANSWER_PLACEHOLDER);
            self.show(Message::sticky(format!("Game over, the answer was: {shown}")));
        } else {
            self.buffer.advance_row();
            self.show_transient(MSG_KEEP_GOING);
            return;
        }

        self.events.push(RenderEvent::Outcome {
            status: self.status,
            answer: self.answer.clone(),
        });
    }
}

/// Releases the submission lock if the judge call is cancelled mid-flight.
struct AbandonOnDrop<'a> {
    controller: Option<&'a mut SubmissionController>,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.abandon();
        }
    }
}
