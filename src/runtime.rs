use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tokio::runtime::Handle;
use tracing::{debug, error};

use crate::judge::{Judge, JudgeError, JudgeReply};
use crate::submission::JudgeRequest;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The judge answered (or failed) the submission in flight.
    Judged(Result<JudgeReply, JudgeError>),
}

/// Source of events (keyboard, resize, judge replies)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Channel shared by the terminal reader and the judge dispatcher.
pub fn event_channel() -> (Sender<GameEvent>, Receiver<GameEvent>) {
    mpsc::channel()
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new(tx: Sender<GameEvent>, rx: Receiver<GameEvent>) -> Self {
        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too; only presses are input
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(GameEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(GameEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    error!(error = %e, "terminal event stream failed");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for headless tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}

/// Runs judge calls on the tokio runtime and posts each reply back to the
/// event loop as [`GameEvent::Judged`].
pub struct JudgeDispatcher {
    judge: Arc<dyn Judge>,
    handle: Handle,
    tx: Sender<GameEvent>,
}

impl JudgeDispatcher {
    pub fn new(judge: Arc<dyn Judge>, handle: Handle, tx: Sender<GameEvent>) -> Self {
        Self { judge, handle, tx }
    }

    /// Exactly one `Judged` event follows every dispatch, even when the judge
    /// task panics.
    pub fn dispatch(&self, request: JudgeRequest) {
        let judge = Arc::clone(&self.judge);
        let tx = self.tx.clone();
        debug!(row = request.row, guess = %request.guess, "dispatching judge call");

        self.handle.spawn(async move {
            let guess = request.guess;
            let joined = tokio::spawn(async move { judge.check(&guess).await }).await;
            let reply = joined.unwrap_or_else(|e| {
                error!(error = %e, "judge task failed");
                Err(JudgeError::Unexpected(e.to_string()))
            });
            if tx.send(GameEvent::Judged(reply)).is_err() {
                debug!("event loop gone, dropping judge reply");
            }
        });
    }
}
