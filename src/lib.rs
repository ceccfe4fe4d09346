// Library surface for the binary, headless tests and alternative front ends.
pub mod app;
pub mod app_dirs;
pub mod buffer;
pub mod confetti;
pub mod config;
pub mod events;
pub mod feedback;
pub mod history;
pub mod judge;
pub mod keyboard;
pub mod runtime;
pub mod session;
pub mod submission;
pub mod ui;

/// Guesses per game.
pub const ROWS: usize = 6;
/// Letters per guess.
pub const COLS: usize = 5;

pub const TICK_RATE_MS: u64 = 100;
