mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

use kadence::{
    config::{Config, ConfigStore, FileConfigStore},
    history::ResultHistory,
    passage::{select_text, Difficulty},
    runtime::{
        Clock, CrosstermEventSource, FixedTicker, Runner, ShellEvent, SystemClock, TickGuard,
    },
    session::{Mode, Phase, Session, SessionConfig},
    TICK_RATE_MS,
};

/// typing speed practice with live wpm, accuracy, and consistency
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Terminal typing practice. Pick a difficulty, type the passage, and watch live words-per-minute, accuracy, and consistency; finished sessions land in a bounded history you can export as CSV."
)]
pub struct Cli {
    /// difficulty of the practice text
    #[clap(short, long, value_enum)]
    difficulty: Option<Difficulty>,

    /// run a timed session of this many seconds
    #[clap(short = 's', long)]
    seconds: Option<u64>,

    /// run a word-count session with this target
    #[clap(short = 'w', long)]
    words: Option<usize>,

    /// custom text to type
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// export session history as CSV on exit
    #[clap(long)]
    export: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results,
}

#[derive(Debug)]
pub struct App {
    pub cli: Cli,
    pub stored: Config,
    pub session: Session,
    pub history: ResultHistory,
    pub state: AppState,
    /// Full current input buffer; the engine receives it wholesale on
    /// every keystroke.
    pub buffer: String,
    /// Latest clock reading, refreshed on every event for rendering.
    pub now_ms: u64,
}

impl App {
    pub fn new(cli: Cli, stored: Config) -> Self {
        let session = Session::new(resolve_session_config(&cli, &stored));
        Self {
            cli,
            stored,
            session,
            history: ResultHistory::new(),
            state: AppState::Typing,
            buffer: String::new(),
            now_ms: 0,
        }
    }

    /// Same text again ("try again").
    pub fn retry(&mut self) {
        let config = self.session.config.clone();
        self.session = Session::new(config);
        self.buffer.clear();
        self.state = AppState::Typing;
    }

    /// Fresh text with the same settings.
    pub fn new_text(&mut self) {
        self.session = Session::new(resolve_session_config(&self.cli, &self.stored));
        self.buffer.clear();
        self.state = AppState::Typing;
    }
}

/// Merge CLI flags over stored preferences into a session configuration and
/// select the practice text.
fn resolve_session_config(cli: &Cli, stored: &Config) -> SessionConfig {
    let difficulty = if cli.prompt.is_some() {
        Difficulty::Custom
    } else {
        cli.difficulty.unwrap_or_else(|| stored.difficulty())
    };

    let mode = if cli.seconds.is_some() {
        Mode::Timed
    } else if cli.words.is_some() {
        Mode::WordCount
    } else {
        stored.mode()
    };

    let target_seconds = match mode {
        Mode::Timed => Some(cli.seconds.or(stored.target_seconds).unwrap_or(30) as f64),
        _ => None,
    };
    let target_word_count = match mode {
        Mode::WordCount => Some(cli.words.or(stored.target_word_count).unwrap_or(25)),
        _ => None,
    };

    let source_text = select_text(difficulty, cli.prompt.as_deref(), &mut rand::thread_rng());

    SessionConfig {
        mode,
        difficulty,
        target_seconds,
        target_word_count,
        source_text,
    }
}

/// Preferences to carry into the next run. A custom prompt is one-shot, so
/// its difficulty is not persisted.
fn persisted_config(app: &App) -> Config {
    let config = &app.session.config;
    let difficulty = if config.difficulty == Difficulty::Custom {
        app.stored.difficulty.clone()
    } else {
        config.difficulty.to_string().to_lowercase()
    };

    Config {
        difficulty,
        mode: config.mode.to_string().to_lowercase(),
        target_seconds: config.target_seconds.map(|s| s as u64),
        target_word_count: config.target_word_count,
    }
}

fn export_history(history: &ResultHistory) {
    if let Some(path) = ResultHistory::default_export_path() {
        let _ = history.export_csv(path);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let stored = store.load();

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let clock = SystemClock::new();
    let mut app = App::new(cli, stored);
    start_shell(&mut terminal, &mut app, &clock)?;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if app.cli.export {
        export_history(&app.history);
    }
    let _ = store.save(&persisted_config(&app));

    Ok(())
}

#[derive(Debug)]
enum ExitType {
    Restart,
    New,
    Quit,
}

fn start_shell<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    clock: &SystemClock,
) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let ticker = FixedTicker::new(Duration::from_millis(TICK_RATE_MS));
    let runner = Runner::new(events, ticker);

    // Ticks carry the token of the session generation that scheduled them;
    // a stale token means the session ended and the tick is a no-op.
    let mut tick_guard = TickGuard::new();
    let mut tick_token: u64 = 0;

    loop {
        let mut exit_type = ExitType::Quit;
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        loop {
            let event = runner.step();
            app.now_ms = clock.now_ms();

            match event {
                ShellEvent::Tick => {
                    if !tick_guard.accepts(tick_token) {
                        continue;
                    }
                    if let Some(update) = app.session.on_tick(app.now_ms) {
                        if let Some(result) = update.completed {
                            tick_guard.end();
                            app.history.record(result);
                            app.state = AppState::Results;
                        }
                        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                    }
                }
                ShellEvent::Resize => {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
                ShellEvent::Key(key) => {
                    match key.code {
                        KeyCode::Esc => {
                            break;
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            break;
                        }
                        KeyCode::Tab => {
                            if app.state == AppState::Typing {
                                match app.session.phase() {
                                    Phase::Active => {
                                        app.session.pause();
                                        tick_guard.end();
                                    }
                                    Phase::Paused => {
                                        app.session.resume(app.now_ms);
                                        tick_token = tick_guard.begin();
                                    }
                                    _ => {}
                                }
                            }
                        }
                        KeyCode::Backspace => {
                            if app.state == AppState::Typing
                                && app.session.phase() == Phase::Active
                            {
                                app.buffer.pop();
                                let update = app.session.apply_input(&app.buffer, app.now_ms);
                                if let Some(result) = update.completed {
                                    tick_guard.end();
                                    app.history.record(result);
                                    app.state = AppState::Results;
                                }
                            }
                        }
                        KeyCode::Left => {
                            exit_type = ExitType::Restart;
                            break;
                        }
                        KeyCode::Right => {
                            exit_type = ExitType::New;
                            break;
                        }
                        KeyCode::Char(c) => match app.state {
                            AppState::Typing => {
                                if app.session.phase() == Phase::Idle {
                                    app.session.start(app.now_ms);
                                    tick_token = tick_guard.begin();
                                }
                                if app.session.phase() == Phase::Active {
                                    app.buffer.push(c);
                                    let update =
                                        app.session.apply_input(&app.buffer, app.now_ms);
                                    if let Some(result) = update.completed {
                                        tick_guard.end();
                                        app.history.record(result);
                                        app.state = AppState::Results;
                                    }
                                }
                            }
                            AppState::Results => match c {
                                'r' => {
                                    exit_type = ExitType::Restart;
                                    break;
                                }
                                'n' => {
                                    exit_type = ExitType::New;
                                    break;
                                }
                                'e' => {
                                    export_history(&app.history);
                                }
                                _ => {}
                            },
                        },
                        _ => {}
                    }
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
        }

        match exit_type {
            ExitType::Restart => {
                tick_guard.end();
                app.retry();
            }
            ExitType::New => {
                tick_guard.end();
                app.new_text();
            }
            ExitType::Quit => break,
        }
    }

    Ok(())
}
