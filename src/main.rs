use std::{
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use gridle::{
    app::{App, AppAction},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::ResultLog,
    judge::HttpJudge,
    runtime::{
        event_channel, CrosstermEventSource, FixedTicker, GameEvent, GameEventSource,
        JudgeDispatcher, Runner, Ticker,
    },
    session::SessionOptions,
    ui, TICK_RATE_MS,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// guess the five-letter word, judged by a remote service
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Guess a five-letter word in six tries. Every guess is scored by a judge service reached over HTTP; the client never knows the answer."
)]
pub struct Cli {
    /// base url of the judge service
    #[clap(short = 'u', long)]
    judge_url: Option<String>,

    /// how long transient messages stay on screen, in milliseconds
    #[clap(long)]
    message_ms: Option<u64>,

    /// give up on a judge request after this many seconds
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// reject feedback tokens outside the known vocabularies instead of reading them as absent
    #[clap(long)]
    strict_feedback: bool,

    /// do not append finished games to the results log
    #[clap(long)]
    no_save: bool,

    /// persist the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// CLI flags win over the config file.
    fn apply_to(&self, mut cfg: Config) -> Config {
        if let Some(url) = &self.judge_url {
            cfg.judge_url = url.clone();
        }
        if let Some(ms) = self.message_ms {
            cfg.message_ms = ms;
        }
        if self.timeout_secs.is_some() {
            cfg.request_timeout_secs = self.timeout_secs;
        }
        if self.strict_feedback {
            cfg.strict_feedback = true;
        }
        if self.no_save {
            cfg.save_results = false;
        }
        cfg
    }
}

fn open_log_file() -> Option<(PathBuf, fs::File)> {
    let path = AppDirs::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;
    Some((path, file))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Never log to the terminal the TUI is drawing on.
    if let Some((path, file)) = open_log_file() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %path.display(), "logging initialized");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tracing();

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    if cli.save_config {
        store
            .save(&config)
            .with_context(|| format!("saving config to {}", store.path().display()))?;
    }
    tracing::info!(judge = %config.judge_url, "starting");

    let runtime = tokio::runtime::Runtime::new().context("building async runtime")?;
    let judge = HttpJudge::new(&config.judge_url, config.request_timeout())
        .context("building HTTP client")?;

    let (tx, rx) = event_channel();
    let dispatcher = JudgeDispatcher::new(Arc::new(judge), runtime.handle().clone(), tx.clone());
    let runner = Runner::new(
        CrosstermEventSource::new(tx, rx),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    let results = config
        .save_results
        .then(AppDirs::results_path)
        .flatten()
        .map(ResultLog::new);
    let mut app = App::new(SessionOptions::from(&config), results);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = run_tui(&mut terminal, &mut app, &runner, &dispatcher);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    runtime.shutdown_timeout(Duration::from_millis(200));
    outcome
}

fn run_tui<B, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    dispatcher: &JudgeDispatcher,
) -> Result<()>
where
    B: Backend,
    E: GameEventSource,
    T: Ticker,
{
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            GameEvent::Tick => app.on_tick(Instant::now()),
            GameEvent::Resize => {}
            GameEvent::Key(key) => match app.handle_key(key, Instant::now()) {
                AppAction::Quit => break,
                AppAction::Judge(request) => dispatcher.dispatch(request),
                AppAction::None => {}
            },
            GameEvent::Judged(reply) => app.on_judged(reply, Instant::now()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["gridle"]);

        assert_eq!(cli.judge_url, None);
        assert_eq!(cli.message_ms, None);
        assert_eq!(cli.timeout_secs, None);
        assert!(!cli.strict_feedback);
        assert!(!cli.no_save);
    }

    #[test]
    fn test_cli_judge_url() {
        let cli = Cli::parse_from(["gridle", "-u", "http://judge:9000"]);
        assert_eq!(cli.judge_url.as_deref(), Some("http://judge:9000"));

        let cli = Cli::parse_from(["gridle", "--judge-url", "http://other"]);
        assert_eq!(cli.judge_url.as_deref(), Some("http://other"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "gridle",
            "--message-ms",
            "500",
            "--timeout-secs",
            "3",
            "--strict-feedback",
            "--no-save",
        ]);
        let cfg = cli.apply_to(Config::default());
        assert_eq!(cfg.message_ms, 500);
        assert_eq!(cfg.request_timeout_secs, Some(3));
        assert!(cfg.strict_feedback);
        assert!(!cfg.save_results);
        assert_eq!(cfg.judge_url, gridle::config::DEFAULT_JUDGE_URL);
    }

    #[test]
    fn test_cli_keeps_config_when_flags_absent() {
        let file_cfg = Config {
            judge_url: "http://from-file".into(),
            message_ms: 900,
            ..Config::default()
        };
        let cfg = Cli::parse_from(["gridle"]).apply_to(file_cfg.clone());
        assert_eq!(cfg, file_cfg);
    }

    #[test]
    fn test_cli_invalid_number() {
        assert!(Cli::try_parse_from(["gridle", "--message-ms", "soon"]).is_err());
    }
}
