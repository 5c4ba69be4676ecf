// Library surface for the engine; the binary shell in main.rs sits on top.
pub mod config;
pub mod history;
pub mod passage;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod time_series;
pub mod util;

/// Cadence of the shell's tick source while a session is active.
pub const TICK_RATE_MS: u64 = 100;
