use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::session::{GameSession, SessionStatus};

/// One finished game as stored in `results.csv`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameRecord {
    pub date: String,
    pub outcome: String,
    pub guesses: usize,
    pub answer: String,
}

impl GameRecord {
    /// `None` while the game is still running.
    pub fn from_session(session: &GameSession, at: DateTime<Local>) -> Option<Self> {
        if session.status() == SessionStatus::InProgress {
            return None;
        }
        Some(Self {
            date: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            outcome: session.status().to_string().to_lowercase(),
            guesses: session.guesses_used(),
            answer: session.answer().unwrap_or_default().to_string(),
        })
    }
}

/// Append-only CSV log of finished games.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &GameRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // header only on first use
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record).map_err(io::Error::other)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeReply;
    use crate::session::Key;
    use serde_json::json;
    use tempfile::tempdir;

    fn won_session() -> GameSession {
        let mut session = GameSession::default();
        for c in "apple".chars() {
            session.handle_key(Key::Letter(c));
        }
        session.handle_key(Key::Submit);
        session
            .apply_judgement(Ok(JudgeReply::new(json!({
                "result": ["green", "green", "green", "green", "green"],
                "win": true
            }))))
            .unwrap();
        session
    }

    #[test]
    fn no_record_while_in_progress() {
        let session = GameSession::default();
        assert_eq!(GameRecord::from_session(&session, Local::now()), None);
    }

    #[test]
    fn record_from_won_session() {
        let record = GameRecord::from_session(&won_session(), Local::now()).unwrap();
        assert_eq!(record.outcome, "won");
        assert_eq!(record.guesses, 1);
        assert_eq!(record.answer, "APPLE");
    }

    #[test]
    fn header_written_once() {
        let dir = tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("state").join("results.csv"));
        let record = GameRecord::from_session(&won_session(), Local::now()).unwrap();
        log.append(&record).unwrap();
        log.append(&record).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,outcome,guesses,answer");
        assert!(lines[1].ends_with(",won,1,APPLE"));
    }
}
