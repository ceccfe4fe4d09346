use thiserror::Error;
use tracing::{debug, info};

use crate::buffer::GuessBuffer;
use crate::feedback::{normalize, FeedbackError, LetterState, TokenPolicy};
use crate::judge::{JudgeError, JudgeReply};

/// A full row handed to the judge. Feedback is applied to `row` no matter
/// what the cursor does in the meantime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JudgeRequest {
    pub row: usize,
    pub guess: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    AwaitingJudge {
        row: usize,
        guess: String,
    },
    Applying,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("row incomplete")]
    IncompleteRow,
    #[error("malformed feedback: {0}")]
    MalformedFeedback(#[from] FeedbackError),
    #[error("guess rejected: {0}")]
    InvalidGuessRejected(String),
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
    #[error("no submission is awaiting the judge")]
    NotAwaiting,
}

impl From<JudgeError> for SubmitError {
    fn from(err: JudgeError) -> Self {
        match err {
            JudgeError::Rejected(message) => SubmitError::InvalidGuessRejected(message),
            JudgeError::Unexpected(detail) => SubmitError::Unexpected(detail),
            other => SubmitError::TransportFailure(other.to_string()),
        }
    }
}

/// A judged guess, ready to be painted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Judged {
    pub row: usize,
    pub letters: Vec<char>,
    pub states: Vec<LetterState>,
    pub win: bool,
    pub answer: Option<String>,
}

/// Resets the phase to `Idle` when dropped, including during unwinding.
struct ReleaseOnDrop<'a> {
    phase: &'a mut SubmissionPhase,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        *self.phase = SubmissionPhase::Idle;
    }
}

/// Guarantees at most one submission in flight.
#[derive(Debug, Default)]
pub struct SubmissionController {
    phase: SubmissionPhase,
    policy: TokenPolicy,
}

impl SubmissionController {
    pub fn new(policy: TokenPolicy) -> Self {
        Self {
            phase: SubmissionPhase::Idle,
            policy,
        }
    }

    pub fn phase(&self) -> &SubmissionPhase {
        &self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.phase != SubmissionPhase::Idle
    }

    /// Takes the lock and hands out the guess to judge.
    ///
    /// `Ok(None)` means the call was ignored: a submission is already in
    /// flight or the game is over.
    pub fn begin(
        &mut self,
        buffer: &GuessBuffer,
        game_over: bool,
    ) -> Result<Option<JudgeRequest>, SubmitError> {
        if game_over || self.is_locked() {
            debug!(game_over, "submit ignored");
            return Ok(None);
        }
        let guess = buffer.current_guess().ok_or(SubmitError::IncompleteRow)?;
        let (row, _) = buffer.cursor();

        info!(row, %guess, "submitting guess");
        self.phase = SubmissionPhase::AwaitingJudge {
            row,
            guess: guess.clone(),
        };
        Ok(Some(JudgeRequest { row, guess }))
    }

    /// Interprets the judge reply and releases the lock on every path.
    pub fn finish(&mut self, reply: Result<JudgeReply, JudgeError>) -> Result<Judged, SubmitError> {
        let policy = self.policy;
        let mut release = ReleaseOnDrop {
            phase: &mut self.phase,
        };

        let (row, guess) = match std::mem::replace(&mut *release.phase, SubmissionPhase::Applying) {
            SubmissionPhase::AwaitingJudge { row, guess } => (row, guess),
            _ => return Err(SubmitError::NotAwaiting),
        };

        let reply = reply?;
        let states = normalize(&reply.body, policy)?;
        let win = reply
            .win()
            .unwrap_or_else(|| states.iter().all(|s| *s == LetterState::Correct));

        info!(row, win, "guess judged");
        Ok(Judged {
            row,
            letters: guess.chars().collect(),
            states,
            win,
            answer: reply.answer(),
        })
    }

    /// Drops an in-flight submission without a reply (the judge call was
    /// cancelled). The row stays editable.
    pub fn abandon(&mut self) {
        if let SubmissionPhase::AwaitingJudge { row, .. } = self.phase {
            debug!(row, "submission abandoned");
        }
        self.phase = SubmissionPhase::Idle;
    }
}
