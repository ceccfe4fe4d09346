use std::collections::HashMap;
use std::time::Instant;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::confetti::Confetti;
use crate::events::RenderEvent;
use crate::feedback::LetterState;
use crate::history::{GameRecord, ResultLog};
use crate::judge::{JudgeError, JudgeReply};
use crate::session::{GameSession, Key, SessionOptions, SessionStatus};
use crate::submission::JudgeRequest;
use crate::{COLS, TICK_RATE_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Start,
    Playing,
    Finished,
}

/// What the event loop has to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    None,
    Judge(JudgeRequest),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownMessage {
    pub text: String,
    pub expires_at: Option<Instant>,
}

/// A painted row being flipped open one tile per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub row: usize,
    pub shown: usize,
}

impl Key {
    pub fn from_key_event(key: &KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Enter => Some(Key::Submit),
            KeyCode::Backspace | KeyCode::Delete => Some(Key::Delete),
            KeyCode::Char(c) if c.is_ascii_alphabetic() => Some(Key::Letter(c.to_ascii_uppercase())),
            _ => None,
        }
    }
}

/// Renderer-side state: the session plus everything about how it is shown.
#[derive(Debug)]
pub struct App {
    pub session: GameSession,
    pub state: AppState,
    pub message: Option<ShownMessage>,
    pub reveal: Option<Reveal>,
    /// Key colours as announced by the session.
    pub key_colors: HashMap<char, LetterState>,
    pub confetti: Confetti,
    options: SessionOptions,
    results: Option<ResultLog>,
}

impl App {
    pub fn new(options: SessionOptions, results: Option<ResultLog>) -> Self {
        Self {
            session: GameSession::new(options),
            state: AppState::Start,
            message: None,
            reveal: None,
            key_colors: HashMap::new(),
            confetti: Confetti::new(),
            options,
            results,
        }
    }

    /// Throws the finished (or abandoned) game away and starts a fresh one.
    pub fn restart(&mut self, now: Instant) {
        info!("starting a new session");
        self.session = GameSession::new(self.options);
        self.state = AppState::Playing;
        self.message = None;
        self.reveal = None;
        self.key_colors.clear();
        self.confetti.stop();
        self.pump_events(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppAction::Quit;
        }
        if key.code == KeyCode::Esc {
            return AppAction::Quit;
        }

        match self.state {
            AppState::Start => {
                if key.code == KeyCode::Enter {
                    self.state = AppState::Playing;
                    self.pump_events(now);
                }
                AppAction::None
            }
            AppState::Playing => {
                let action = match Key::from_key_event(&key) {
                    Some(k) => self
                        .session
                        .handle_key(k)
                        .map_or(AppAction::None, AppAction::Judge),
                    None => AppAction::None,
                };
                self.pump_events(now);
                action
            }
            AppState::Finished => {
                match key.code {
                    KeyCode::Char('r') | KeyCode::Char('n') | KeyCode::Enter => self.restart(now),
                    KeyCode::Char('q') => return AppAction::Quit,
                    _ => {}
                }
                AppAction::None
            }
        }
    }

    pub fn on_judged(&mut self, reply: Result<JudgeReply, JudgeError>, now: Instant) {
        // errors are already surfaced as messages by the session
        let _ = self.session.apply_judgement(reply);
        self.pump_events(now);
    }

    pub fn on_tick(&mut self, now: Instant) {
        if let Some(shown) = &self.message {
            if shown.expires_at.is_some_and(|at| now >= at) {
                self.message = None;
            }
        }

        if let Some(reveal) = &mut self.reveal {
            reveal.shown += 1;
            if reveal.shown >= COLS {
                self.reveal = None;
            }
        }

        if self.confetti.is_active() {
            self.confetti.update(TICK_RATE_MS as f64 / 1000.0);
        }
    }

    /// How many tiles of `row` may show their colour right now.
    pub fn revealed_in_row(&self, row: usize) -> usize {
        match self.reveal {
            Some(reveal) if reveal.row == row => reveal.shown,
            _ => COLS,
        }
    }

    fn pump_events(&mut self, now: Instant) {
        for event in self.session.drain_events() {
            match event {
                RenderEvent::Message(message) => {
                    self.message = Some(ShownMessage {
                        text: message.text,
                        expires_at: message.auto_clear.map(|d| now + d),
                    });
                }
                RenderEvent::Tile {
                    row,
                    state: Some(_),
                    ..
                } => {
                    if self.reveal.map(|r| r.row) != Some(row) {
                        self.reveal = Some(Reveal { row, shown: 0 });
                    }
                }
                RenderEvent::Tile { .. } => {}
                RenderEvent::Key { letter, state } => {
                    self.key_colors.insert(letter, state);
                }
                RenderEvent::Outcome { status, answer } => {
                    info!(%status, ?answer, "game finished");
                    self.state = AppState::Finished;
                    if status == SessionStatus::Won {
                        self.confetti.start();
                    }
                    self.record_result();
                }
            }
        }
    }

    fn record_result(&self) {
        let Some(log) = &self.results else {
            return;
        };
        let Some(record) = GameRecord::from_session(&self.session, Local::now()) else {
            return;
        };
        if let Err(e) = log.append(&record) {
            warn!(path = %log.path().display(), error = %e, "could not save result");
        }
    }
}
