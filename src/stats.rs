use crate::time_series::WpmSample;
use crate::util::{round2, std_dev};

/// Derived statistics for a session, recomputed on every update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatsSnapshot {
    pub net_wpm: f64,
    pub raw_wpm: f64,
    pub accuracy_percent: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_typed_chars: usize,
    pub elapsed_seconds: f64,
    pub consistency_percent: f64,
}

/// Compute a full snapshot from the typed buffer, the source text, the
/// elapsed time, and the WPM samples collected so far.
///
/// Scoring walks the typed buffer by scalar-value index: a character is
/// correct when it matches the source at the same index, otherwise
/// incorrect — including anything typed past the end of the source.
/// Degenerate inputs (zero elapsed time, empty buffer) yield zeroed rates
/// rather than NaN.
pub fn compute_stats(
    typed: &str,
    source: &str,
    elapsed_seconds: f64,
    samples: &[WpmSample],
) -> StatsSnapshot {
    let source_chars: Vec<char> = source.chars().collect();

    let mut correct_chars = 0usize;
    let mut incorrect_chars = 0usize;
    for (idx, c) in typed.chars().enumerate() {
        if source_chars.get(idx) == Some(&c) {
            correct_chars += 1;
        } else {
            incorrect_chars += 1;
        }
    }
    let total_typed_chars = correct_chars + incorrect_chars;

    let elapsed_seconds = if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
        elapsed_seconds
    } else {
        0.0
    };

    let accuracy_percent = if total_typed_chars == 0 {
        0.0
    } else {
        round2(correct_chars as f64 / total_typed_chars as f64 * 100.0)
    };

    let (raw_wpm, net_wpm) = if elapsed_seconds > 0.0 {
        let elapsed_minutes = elapsed_seconds / 60.0;
        // canonical 5-characters-per-word convention
        let words_typed = total_typed_chars as f64 / 5.0;
        let raw = (words_typed / elapsed_minutes).round();
        let errors_per_minute = incorrect_chars as f64 / elapsed_minutes;
        let net = (raw - errors_per_minute).round().max(0.0);
        (raw, net)
    } else {
        (0.0, 0.0)
    };

    let consistency_percent = consistency(samples);

    StatsSnapshot {
        net_wpm,
        raw_wpm,
        accuracy_percent,
        correct_chars,
        incorrect_chars,
        total_typed_chars,
        elapsed_seconds,
        consistency_percent,
    }
}

/// 0-100 score from the variability of the sampled WPM values: 100 minus
/// twice the population standard deviation, clamped. Fewer than two samples
/// give no variability signal and score 100.
fn consistency(samples: &[WpmSample]) -> f64 {
    if samples.len() < 2 {
        return 100.0;
    }
    let wpms: Vec<f64> = samples.iter().map(|s| s.wpm).collect();
    let sd = std_dev(&wpms).unwrap_or(0.0);
    (100.0 - 2.0 * sd).clamp(0.0, 100.0).round()
}
