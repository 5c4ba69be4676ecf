use clap::ValueEnum;

use crate::history::SessionResult;
use crate::passage::Difficulty;
use crate::stats::{compute_stats, StatsSnapshot};
use crate::time_series::{record_sample, WpmSample};

/// How a session decides it is over.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum Mode {
    /// Finish when the whole source text has been typed.
    FixedQuote,
    /// Finish when the target duration has elapsed.
    Timed,
    /// Finish when the target number of words has been typed.
    WordCount,
}

/// Immutable per-session configuration, fixed before the session starts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub target_seconds: Option<f64>,
    pub target_word_count: Option<usize>,
    pub source_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Paused,
    Completed,
}

/// Mutable session state, written only by the engine.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    pub started_at_ms: Option<u64>,
    pub last_tick_ms: Option<u64>,
    pub typed: String,
    pub samples: Vec<WpmSample>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            started_at_ms: None,
            last_tick_ms: None,
            typed: String::new(),
            samples: Vec::new(),
        }
    }
}

/// What the engine hands back after an update: fresh statistics and, when
/// the update finished the session, the frozen result.
#[derive(Debug, Clone)]
pub struct InputUpdate {
    pub stats: StatsSnapshot,
    pub completed: Option<SessionResult>,
}

/// One practice attempt. The shell owns the value and calls the transition
/// methods; the engine never touches a clock or scheduler itself — every
/// time-dependent operation takes the shell's `now_ms` reading.
#[derive(Debug)]
pub struct Session {
    pub config: SessionConfig,
    pub state: SessionState,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Wall-clock seconds since the session started. Paused time is not
    /// excluded; the countdown keeps running through a pause.
    pub fn elapsed_seconds(&self, now_ms: u64) -> f64 {
        match self.state.started_at_ms {
            Some(started) => now_ms.saturating_sub(started) as f64 / 1000.0,
            None => 0.0,
        }
    }

    /// Seconds left on a timed session, floored at zero.
    pub fn seconds_remaining(&self, now_ms: u64) -> Option<f64> {
        let target = self.config.target_seconds?;
        Some((target - self.elapsed_seconds(now_ms)).max(0.0))
    }

    /// Idle|Completed -> Active. Clears the typed buffer and samples and
    /// records the start instant. A no-op from Active or Paused.
    pub fn start(&mut self, now_ms: u64) {
        match self.state.phase {
            Phase::Idle | Phase::Completed => {
                self.state = SessionState {
                    phase: Phase::Active,
                    started_at_ms: Some(now_ms),
                    last_tick_ms: Some(now_ms),
                    typed: String::new(),
                    samples: Vec::new(),
                };
            }
            Phase::Active | Phase::Paused => {}
        }
    }

    /// Active -> Paused. State is frozen; the tick source should be stopped.
    pub fn pause(&mut self) {
        if self.state.phase == Phase::Active {
            self.state.phase = Phase::Paused;
        }
    }

    /// Paused -> Active. `started_at_ms` is deliberately left alone, so the
    /// elapsed time accumulated during the pause counts.
    pub fn resume(&mut self, now_ms: u64) {
        if self.state.phase == Phase::Paused {
            self.state.phase = Phase::Active;
            self.state.last_tick_ms = Some(now_ms);
        }
    }

    /// Any phase -> Idle, dropping all session state.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }

    /// Replace the typed buffer with the shell's full current input, sample,
    /// recompute statistics, and evaluate completion. Input in any phase but
    /// Active is ignored: the state is untouched and the current statistics
    /// are returned.
    pub fn apply_input(&mut self, full_buffer: &str, now_ms: u64) -> InputUpdate {
        if self.state.phase != Phase::Active {
            return InputUpdate {
                stats: self.current_stats(now_ms),
                completed: None,
            };
        }

        self.state.typed = full_buffer.to_string();
        self.update(now_ms)
    }

    /// Advance the session on the shell's periodic tick. Drives sampling and
    /// time-based completion between keystrokes. Returns None unless Active.
    pub fn on_tick(&mut self, now_ms: u64) -> Option<InputUpdate> {
        if self.state.phase != Phase::Active {
            return None;
        }
        Some(self.update(now_ms))
    }

    fn update(&mut self, now_ms: u64) -> InputUpdate {
        self.state.last_tick_ms = Some(now_ms);
        let elapsed = self.elapsed_seconds(now_ms);

        // sampling happens once per update, before stats consume the list
        record_sample(
            &mut self.state.samples,
            elapsed,
            self.state.typed.chars().count(),
        );

        let stats = compute_stats(
            &self.state.typed,
            &self.config.source_text,
            elapsed,
            &self.state.samples,
        );

        let completed = if self.is_complete(elapsed) {
            self.state.phase = Phase::Completed;
            Some(SessionResult::new(
                stats,
                self.config.difficulty,
                self.config.source_text.chars().count(),
            ))
        } else {
            None
        };

        InputUpdate { stats, completed }
    }

    fn is_complete(&self, elapsed_seconds: f64) -> bool {
        match self.config.mode {
            Mode::FixedQuote => {
                self.state.typed.chars().count() == self.config.source_text.chars().count()
            }
            Mode::Timed => self
                .config
                .target_seconds
                .is_some_and(|target| elapsed_seconds >= target),
            Mode::WordCount => self
                .config
                .target_word_count
                .is_some_and(|target| word_tokens(&self.state.typed) >= target),
        }
    }

    /// Statistics for the state as it stands, without mutating anything.
    pub fn current_stats(&self, now_ms: u64) -> StatsSnapshot {
        // a finished or paused session reports up to its last update, not now
        let at_ms = match self.state.phase {
            Phase::Active => now_ms,
            _ => self.state.last_tick_ms.unwrap_or(now_ms),
        };
        compute_stats(
            &self.state.typed,
            &self.config.source_text,
            self.elapsed_seconds(at_ms),
            &self.state.samples,
        )
    }
}

/// Token count under the literal split-on-single-space rule: consecutive
/// spaces yield empty tokens, and those count.
pub fn word_tokens(typed: &str) -> usize {
    typed.split(' ').count()
}
