//! The judge: the remote service that scores a guess.
//!
//! The client never knows the answer. It sends one guess and gets back a JSON
//! object carrying per-letter feedback, an optional win flag and, usually only
//! at the end of a game, the answer itself.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const GUESS_PATH: &str = "/api/guess";
const REJECTION_FALLBACK: &str = "invalid request";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JudgeError {
    /// The judge refused the word itself (not in its dictionary, wrong length).
    #[error("{0}")]
    Rejected(String),
    #[error("judge answered with status {0}")]
    Status(u16),
    #[error("judge unreachable: {0}")]
    Transport(String),
    #[error("judge reply could not be decoded: {0}")]
    Body(String),
    #[error("judge call failed unexpectedly: {0}")]
    Unexpected(String),
}

/// A successful judge reply, kept as the raw JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeReply {
    pub body: Value,
}

impl JudgeReply {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// The explicit win flag, if the judge sent one.
    pub fn win(&self) -> Option<bool> {
        self.body.get("win").and_then(Value::as_bool)
    }

    pub fn answer(&self) -> Option<String> {
        self.body
            .get("answer")
            .and_then(Value::as_str)
            .filter(|a| !a.trim().is_empty())
            .map(|a| a.trim().to_uppercase())
    }
}

#[async_trait]
pub trait Judge: Send + Sync {
    async fn check(&self, guess: &str) -> Result<JudgeReply, JudgeError>;
}

#[derive(Serialize)]
struct GuessRequest<'a> {
    guess: &'a str,
}

/// Judge reached over HTTP: `POST {base}/api/guess` with `{"guess": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpJudge {
    client: Client,
    guess_url: String,
}

impl HttpJudge {
    /// `timeout` bounds each request; `None` waits as long as the server does.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            guess_url: format!("{}{GUESS_PATH}", base_url.trim_end_matches('/')),
        })
    }

    pub fn guess_url(&self) -> &str {
        &self.guess_url
    }
}

fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error", "description"]
                .iter()
                .find_map(|key| v.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| REJECTION_FALLBACK.to_string())
}

#[async_trait]
impl Judge for HttpJudge {
    async fn check(&self, guess: &str) -> Result<JudgeReply, JudgeError> {
        let lowered = guess.to_lowercase();
        let response = self
            .client
            .post(&self.guess_url)
            .json(&GuessRequest { guess: &lowered })
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(%status, guess = %lowered, "judge responded");

        if status == StatusCode::BAD_REQUEST {
            let text = response.text().await.unwrap_or_default();
            return Err(JudgeError::Rejected(rejection_message(&text)));
        }
        if !status.is_success() {
            warn!(%status, "judge returned a failure status");
            return Err(JudgeError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| JudgeError::Body(e.to_string()))?;
        if !body.is_object() {
            return Err(JudgeError::Body("expected a JSON object".to_string()));
        }
        Ok(JudgeReply::new(body))
    }
}

/// Judge that plays back canned replies in order, recording every guess.
/// Used by the headless tests.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    replies: Mutex<VecDeque<Result<JudgeReply, JudgeError>>>,
    guesses: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<JudgeReply, JudgeError>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            guesses: Mutex::new(Vec::new()),
        }
    }

    pub fn guesses(&self) -> Vec<String> {
        self.guesses
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn check(&self, guess: &str) -> Result<JudgeReply, JudgeError> {
        if let Ok(mut guesses) = self.guesses.lock() {
            guesses.push(guess.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(JudgeError::Unexpected("no scripted reply left".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_win_flag() {
        assert_eq!(JudgeReply::new(json!({"win": true})).win(), Some(true));
        assert_eq!(JudgeReply::new(json!({"win": false})).win(), Some(false));
        assert_eq!(JudgeReply::new(json!({"result": []})).win(), None);
        assert_eq!(JudgeReply::new(json!({"win": "yes"})).win(), None);
    }

    #[test]
    fn test_reply_answer() {
        assert_eq!(
            JudgeReply::new(json!({"answer": "apple"})).answer().as_deref(),
            Some("APPLE")
        );
        assert_eq!(JudgeReply::new(json!({"answer": null})).answer(), None);
        assert_eq!(JudgeReply::new(json!({"answer": " "})).answer(), None);
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(rejection_message(r#"{"message": "word not found"}"#), "word not found");
        assert_eq!(rejection_message(r#"{"error": "too short"}"#), "too short");
        assert_eq!(rejection_message("<html>Bad Request</html>"), REJECTION_FALLBACK);
        assert_eq!(rejection_message(r#"{"message": ""}"#), REJECTION_FALLBACK);
    }

    #[test]
    fn test_guess_url_joins_base() {
        let judge = HttpJudge::new("http://127.0.0.1:5000/", None).unwrap();
        assert_eq!(judge.guess_url(), "http://127.0.0.1:5000/api/guess");
    }

    #[tokio::test]
    async fn test_scripted_judge_plays_back_in_order() {
        let judge = ScriptedJudge::new([
            Err(JudgeError::Rejected("nope".into())),
            Ok(JudgeReply::new(json!({"win": true}))),
        ]);
        assert_eq!(
            judge.check("AAAAA").await,
            Err(JudgeError::Rejected("nope".into()))
        );
        assert!(judge.check("BBBBB").await.is_ok());
        assert!(matches!(
            judge.check("CCCCC").await,
            Err(JudgeError::Unexpected(_))
        ));
        assert_eq!(judge.guesses(), vec!["AAAAA", "BBBBB", "CCCCC"]);
    }
}
