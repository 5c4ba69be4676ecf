use chrono::{DateTime, Local};
use directories::ProjectDirs;
use itertools::Itertools;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::passage::Difficulty;
use crate::stats::StatsSnapshot;
use crate::util::mean;

pub const HISTORY_CAPACITY: usize = 20;

/// Frozen copy of a completed session's final statistics. Built exactly once,
/// when the session transitions to Completed, and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub stats: StatsSnapshot,
    pub timestamp: DateTime<Local>,
    pub difficulty: Difficulty,
    pub text_length: usize,
}

impl SessionResult {
    pub fn new(stats: StatsSnapshot, difficulty: Difficulty, text_length: usize) -> Self {
        Self {
            stats,
            timestamp: Local::now(),
            difficulty,
            text_length,
        }
    }
}

/// Bounded, newest-first list of completed session results.
#[derive(Debug, Default)]
pub struct ResultHistory {
    entries: Vec<SessionResult>,
}

impl ResultHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a result, evicting the oldest entry past capacity.
    pub fn record(&mut self, result: SessionResult) {
        self.entries.insert(0, result);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn entries(&self) -> &[SessionResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (best, worst) net WPM across the retained results.
    pub fn best_and_worst_net_wpm(&self) -> Option<(f64, f64)> {
        self.entries
            .iter()
            .map(|r| r.stats.net_wpm)
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .into_option()
            .map(|(min, max)| (max, min))
    }

    pub fn average_net_wpm(&self) -> Option<f64> {
        let wpms: Vec<f64> = self.entries.iter().map(|r| r.stats.net_wpm).collect();
        mean(&wpms)
    }

    /// Write the retained results as CSV, newest first.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "date",
            "difficulty",
            "text_length",
            "net_wpm",
            "raw_wpm",
            "accuracy",
            "consistency",
            "elapsed_secs",
        ])?;

        for result in &self.entries {
            writer.write_record(&[
                result.timestamp.format("%c").to_string(),
                result.difficulty.to_string(),
                result.text_length.to_string(),
                format!("{}", result.stats.net_wpm),
                format!("{}", result.stats.raw_wpm),
                format!("{}", result.stats.accuracy_percent),
                format!("{}", result.stats.consistency_percent),
                format!("{:.2}", result.stats.elapsed_seconds),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Default export location under the per-user data directory.
    pub fn default_export_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "kadence").map(|pd| pd.data_dir().join("history.csv"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_wpm(net_wpm: f64) -> SessionResult {
        let stats = StatsSnapshot {
            net_wpm,
            raw_wpm: net_wpm + 2.0,
            accuracy_percent: 95.0,
            correct_chars: 95,
            incorrect_chars: 5,
            total_typed_chars: 100,
            elapsed_seconds: 60.0,
            consistency_percent: 90.0,
        };
        SessionResult::new(stats, Difficulty::Medium, 100)
    }

    #[test]
    fn record_prepends_newest_first() {
        let mut history = ResultHistory::new();
        history.record(result_with_wpm(10.0));
        history.record(result_with_wpm(20.0));

        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].stats.net_wpm, 20.0);
        assert_eq!(history.entries()[1].stats.net_wpm, 10.0);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = ResultHistory::new();
        for i in 0..HISTORY_CAPACITY {
            history.record(result_with_wpm(i as f64));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);

        history.record(result_with_wpm(99.0));
        assert_eq!(history.len(), HISTORY_CAPACITY);
        // newest at the front, the original first entry (0.0) evicted
        assert_eq!(history.entries()[0].stats.net_wpm, 99.0);
        assert!(history
            .entries()
            .iter()
            .all(|r| r.stats.net_wpm != 0.0));
    }

    #[test]
    fn summaries_over_entries() {
        let mut history = ResultHistory::new();
        assert_eq!(history.best_and_worst_net_wpm(), None);
        assert_eq!(history.average_net_wpm(), None);

        history.record(result_with_wpm(30.0));
        history.record(result_with_wpm(60.0));
        history.record(result_with_wpm(45.0));

        assert_eq!(history.best_and_worst_net_wpm(), Some((60.0, 30.0)));
        assert_eq!(history.average_net_wpm(), Some(45.0));
    }

    #[test]
    fn single_entry_summary() {
        let mut history = ResultHistory::new();
        history.record(result_with_wpm(42.0));
        assert_eq!(history.best_and_worst_net_wpm(), Some((42.0, 42.0)));
    }

    #[test]
    fn export_csv_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");

        let mut history = ResultHistory::new();
        history.record(result_with_wpm(33.0));
        history.record(result_with_wpm(44.0));
        history.export_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,difficulty,text_length,net_wpm"));
        assert!(lines[1].contains("44"));
        assert!(lines[2].contains("33"));
    }

    #[test]
    fn export_csv_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("history.csv");

        let history = ResultHistory::new();
        history.export_csv(&path).unwrap();
        assert!(path.exists());
    }
}
