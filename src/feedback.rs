use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::COLS;

/// Field names that may carry the per-letter judgments, in lookup order.
pub const FEEDBACK_FIELDS: [&str; 3] = ["result", "feedback", "colors"];

/// Correctness of one letter at one grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LetterState {
    Absent,
    Present,
    Correct,
}

impl LetterState {
    pub fn priority(self) -> u8 {
        match self {
            LetterState::Correct => 3,
            LetterState::Present => 2,
            LetterState::Absent => 1,
        }
    }

    /// Maps one judge token from either vocabulary; `None` if unrecognized.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "correct" | "green" => Some(LetterState::Correct),
            "present" | "yellow" => Some(LetterState::Present),
            "absent" | "gray" | "grey" => Some(LetterState::Absent),
            _ => None,
        }
    }
}

impl PartialOrd for LetterState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LetterState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority().cmp(&other.priority())
    }
}

/// What to do with a token outside both vocabularies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Treat it as `Absent` (what the browser client always did).
    #[default]
    Lenient,
    /// Reject the whole payload.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    #[error("no feedback field (expected one of result, feedback, colors)")]
    MissingField,
    #[error("feedback field `{0}` is not a list")]
    NotAList(&'static str),
    #[error("expected {expected} feedback entries, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("feedback entry {index} is not a string")]
    NotAString { index: usize },
    #[error("unrecognized feedback token `{token}` at position {index}")]
    UnknownToken { index: usize, token: String },
}

/// Translates a judge payload into exactly `COLS` letter states.
pub fn normalize(payload: &Value, policy: TokenPolicy) -> Result<Vec<LetterState>, FeedbackError> {
    let (field, raw) = FEEDBACK_FIELDS
        .iter()
        .find_map(|&name| match payload.get(name) {
            Some(Value::Null) | None => None,
            Some(v) => Some((name, v)),
        })
        .ok_or(FeedbackError::MissingField)?;

    let entries = raw.as_array().ok_or(FeedbackError::NotAList(field))?;
    if entries.len() != COLS {
        return Err(FeedbackError::WrongLength {
            expected: COLS,
            actual: entries.len(),
        });
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let token = entry.as_str().ok_or(FeedbackError::NotAString { index })?;
            match (LetterState::from_token(token), policy) {
                (Some(state), _) => Ok(state),
                (None, TokenPolicy::Lenient) => {
                    warn!(token, index, "unrecognized feedback token, treating as absent");
                    Ok(LetterState::Absent)
                }
                (None, TokenPolicy::Strict) => Err(FeedbackError::UnknownToken {
                    index,
                    token: token.to_string(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    use LetterState::{Absent, Correct, Present};

    #[test]
    fn test_priority_ordering() {
        assert!(Correct > Present);
        assert!(Present > Absent);
        assert_eq!(Correct.priority(), 3);
        assert_eq!(Absent.priority(), 1);
    }

    #[test]
    fn test_color_vocabulary() {
        let payload = json!({"feedback": ["green", "gray", "yellow", "green", "green"], "win": false});
        let states = normalize(&payload, TokenPolicy::Lenient).unwrap();
        assert_eq!(states, vec![Correct, Absent, Present, Correct, Correct]);
    }

    #[test]
    fn test_state_vocabulary() {
        let payload = json!({"result": ["correct", "absent", "present", "absent", "correct"]});
        let states = normalize(&payload, TokenPolicy::Lenient).unwrap();
        assert_eq!(states, vec![Correct, Absent, Present, Absent, Correct]);
    }

    #[test]
    fn test_field_lookup_order() {
        let payload = json!({
            "colors": ["gray", "gray", "gray", "gray", "gray"],
            "result": ["green", "green", "green", "green", "green"],
        });
        let states = normalize(&payload, TokenPolicy::Lenient).unwrap();
        assert_eq!(states, vec![Correct; COLS]);
    }

    #[test]
    fn test_null_field_is_skipped() {
        let payload = json!({"result": null, "colors": ["GREEN", "Yellow", "grey", "gray", "gray"]});
        let states = normalize(&payload, TokenPolicy::Lenient).unwrap();
        assert_eq!(states, vec![Correct, Present, Absent, Absent, Absent]);
    }

    #[test]
    fn test_missing_field() {
        let payload = json!({"win": true});
        assert_eq!(
            normalize(&payload, TokenPolicy::Lenient),
            Err(FeedbackError::MissingField)
        );
    }

    #[test]
    fn test_wrong_length() {
        let payload = json!({"result": ["green", "green"]});
        assert_eq!(
            normalize(&payload, TokenPolicy::Lenient),
            Err(FeedbackError::WrongLength {
                expected: 5,
                actual: 2
            })
        );
    }

    #[test]
    fn test_not_a_list() {
        let payload = json!({"result": "green"});
        assert_matches!(
            normalize(&payload, TokenPolicy::Lenient),
            Err(FeedbackError::NotAList("result"))
        );
    }

    #[test]
    fn test_non_string_entry() {
        let payload = json!({"result": ["green", 1, "gray", "gray", "gray"]});
        assert_matches!(
            normalize(&payload, TokenPolicy::Lenient),
            Err(FeedbackError::NotAString { index: 1 })
        );
    }

    #[test]
    fn test_unknown_token_lenient_falls_back_to_absent() {
        let payload = json!({"result": ["green", "purple", "gray", "gray", "gray"]});
        let states = normalize(&payload, TokenPolicy::Lenient).unwrap();
        assert_eq!(states[1], Absent);
    }

    #[test]
    fn test_unknown_token_strict_is_rejected() {
        let payload = json!({"result": ["green", "purple", "gray", "gray", "gray"]});
        assert_matches!(
            normalize(&payload, TokenPolicy::Strict),
            Err(FeedbackError::UnknownToken { index: 1, ref token }) if token == "purple"
        );
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(Correct.to_string(), "correct");
        assert_eq!(Absent.to_string(), "absent");
    }
}
