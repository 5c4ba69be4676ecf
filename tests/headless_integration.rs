use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use kadence::history::ResultHistory;
use kadence::passage::Difficulty;
use kadence::runtime::{
    Clock, FixedTicker, ManualClock, Runner, ShellEvent, TestEventSource, TickGuard,
};
use kadence::session::{Mode, Phase, Session, SessionConfig};

fn quote_config(source: &str) -> SessionConfig {
    SessionConfig {
        mode: Mode::FixedQuote,
        difficulty: Difficulty::Medium,
        target_seconds: None,
        target_word_count: None,
        source_text: source.to_string(),
    }
}

// Headless flow using the internal runtime without a TTY: keystrokes come
// through the test event source and the clock is cranked by hand.
#[test]
fn headless_typing_flow_completes() {
    let mut session = Session::new(quote_config("hi"));
    let mut history = ResultHistory::new();
    let clock = ManualClock::new();

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    for c in ['h', 'i'] {
        tx.send(ShellEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::NONE,
        )))
        .unwrap();
    }

    let mut buffer = String::new();
    for _ in 0..100u32 {
        clock.advance(100);
        match runner.step() {
            ShellEvent::Tick => {
                session.on_tick(clock.now_ms());
            }
            ShellEvent::Resize => {}
            ShellEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    if session.phase() == Phase::Idle {
                        session.start(clock.now_ms());
                    }
                    buffer.push(c);
                    let update = session.apply_input(&buffer, clock.now_ms());
                    if let Some(result) = update.completed {
                        history.record(result);
                        break;
                    }
                }
            }
        }
    }

    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(history.len(), 1);
    assert_eq!(history.entries()[0].stats.accuracy_percent, 100.0);
}

#[test]
fn headless_timed_session_finishes_by_ticks() {
    let mut session = Session::new(SessionConfig {
        mode: Mode::Timed,
        target_seconds: Some(0.5),
        ..quote_config("never finished by typing")
    });
    let clock = ManualClock::new();

    let (_tx, rx) = mpsc::channel::<ShellEvent>();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(1));
    let runner = Runner::new(es, ticker);

    session.start(clock.now_ms());

    let mut completed = None;
    for _ in 0..100u32 {
        clock.advance(100);
        if let ShellEvent::Tick = runner.step() {
            if let Some(update) = session.on_tick(clock.now_ms()) {
                if update.completed.is_some() {
                    completed = update.completed;
                    break;
                }
            }
        }
    }

    assert!(completed.is_some(), "timed session should finish by ticks");
    assert_eq!(session.phase(), Phase::Completed);
    assert!(completed.unwrap().stats.elapsed_seconds >= 0.5);
}

// A tick whose token predates the session's end must do nothing, even if it
// is delivered late.
#[test]
fn stale_tick_is_a_noop() {
    let mut session = Session::new(quote_config("abc"));
    let mut guard = TickGuard::new();

    session.start(0);
    let token = guard.begin();
    session.apply_input("a", 500);

    // session ends; outstanding token is invalidated
    session.reset();
    guard.end();

    // the in-flight tick arrives afterwards
    if guard.accepts(token) {
        session.on_tick(1_000);
    }

    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.state.typed.is_empty());
    assert_eq!(session.state.last_tick_ms, None);
}

#[test]
fn fresh_token_after_restart_accepts_ticks() {
    let mut session = Session::new(quote_config("abc"));
    let mut guard = TickGuard::new();

    session.start(0);
    let first = guard.begin();

    session.reset();
    guard.end();

    session.start(2_000);
    let second = guard.begin();

    assert!(!guard.accepts(first));
    assert!(guard.accepts(second));

    if guard.accepts(second) {
        assert!(session.on_tick(2_500).is_some());
    }
    assert_eq!(session.state.last_tick_ms, Some(2_500));
}
