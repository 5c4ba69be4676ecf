use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Monotonic millisecond clock. The engine itself only ever sees `now_ms`
/// readings taken from one of these, so tests can drive time by hand.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Production clock, monotonic from process start.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-cranked clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Generation counter tying tick deliveries to the session that scheduled
/// them. The shell takes a fresh token when a session enters Active and
/// invalidates on every transition out, so a tick issued for a dead session
/// checks its token, finds it stale, and does nothing.
#[derive(Debug, Default)]
pub struct TickGuard {
    generation: u64,
}

impl TickGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate outstanding tokens and issue a new one.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Invalidate outstanding tokens without issuing a new one.
    pub fn end(&mut self) {
        self.generation += 1;
    }

    pub fn accepts(&self, token: u64) -> bool {
        token == self.generation
    }
}

/// Unified event type consumed by the shell's event loop.
#[derive(Clone, Debug)]
pub enum ShellEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait ShellEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<ShellEvent, RecvTimeoutError>;
}

/// Production event source backed by a crossterm reader thread.
pub struct CrosstermEventSource {
    rx: Receiver<ShellEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(ShellEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(ShellEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ShellEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-backed event source for tests.
pub struct TestEventSource {
    rx: Receiver<ShellEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<ShellEvent>) -> Self {
        Self { rx }
    }
}

impl ShellEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ShellEvent, RecvTimeoutError> {
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

/// Advances the shell one event at a time: the next input event, or a Tick
/// when the tick interval expires first.
pub struct Runner<E: ShellEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: ShellEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn step(&self) -> ShellEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                ShellEvent::Tick
            }
        }
    }
}
