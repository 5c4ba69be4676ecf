use assert_matches::assert_matches;
use kadence::history::{ResultHistory, HISTORY_CAPACITY};
use kadence::passage::Difficulty;
use kadence::session::{Mode, Phase, Session, SessionConfig};

fn quote_config(source: &str) -> SessionConfig {
    SessionConfig {
        mode: Mode::FixedQuote,
        difficulty: Difficulty::Easy,
        target_seconds: None,
        target_word_count: None,
        source_text: source.to_string(),
    }
}

/// Type the whole source, one keystroke every `cadence_ms`, starting at t=0.
fn type_through(session: &mut Session, history: &mut ResultHistory, cadence_ms: u64) {
    let source = session.config.source_text.clone();
    session.start(0);

    let mut buffer = String::new();
    for (i, c) in source.chars().enumerate() {
        buffer.push(c);
        let now_ms = (i as u64 + 1) * cadence_ms;
        let update = session.apply_input(&buffer, now_ms);
        if let Some(result) = update.completed {
            history.record(result);
            return;
        }
    }
    panic!("typing the full source should have completed the session");
}

#[test]
fn full_quote_session_records_history() {
    let mut session = Session::new(quote_config("hello world"));
    let mut history = ResultHistory::new();

    type_through(&mut session, &mut history, 200);

    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(history.len(), 1);

    let result = &history.entries()[0];
    assert_eq!(result.stats.accuracy_percent, 100.0);
    assert_eq!(result.stats.correct_chars, 11);
    assert_eq!(result.stats.incorrect_chars, 0);
    assert_eq!(result.text_length, 11);
    assert_eq!(result.difficulty, Difficulty::Easy);
}

#[test]
fn timed_session_completes_on_tick_without_input() {
    let mut session = Session::new(SessionConfig {
        mode: Mode::Timed,
        target_seconds: Some(2.0),
        ..quote_config("anything at all")
    });
    session.start(0);
    session.apply_input("any", 500);

    assert!(session.on_tick(1_900).unwrap().completed.is_none());

    let update = session.on_tick(2_100).unwrap();
    assert_matches!(update.completed, Some(_));
    assert_eq!(session.phase(), Phase::Completed);
    assert!(update.stats.elapsed_seconds >= 2.0);
}

#[test]
fn word_count_literal_space_splitting() {
    let mut session = Session::new(SessionConfig {
        mode: Mode::WordCount,
        target_word_count: Some(3),
        ..quote_config("one two three four")
    });
    session.start(0);

    // "a  b" splits into three tokens under the literal single-space rule
    let update = session.apply_input("a  b", 1_000);
    assert_matches!(update.completed, Some(_));
}

#[test]
fn word_count_single_spaces() {
    let mut session = Session::new(SessionConfig {
        mode: Mode::WordCount,
        target_word_count: Some(3),
        ..quote_config("one two three four")
    });
    session.start(0);

    assert!(session.apply_input("one two", 1_000).completed.is_none());
    let update = session.apply_input("one two three", 2_000);
    assert_matches!(update.completed, Some(_));
}

#[test]
fn history_evicts_oldest_at_capacity() {
    let mut history = ResultHistory::new();

    for round in 0..=HISTORY_CAPACITY {
        // vary the text so entries are distinguishable
        let source = "ab".repeat(round + 1);
        let mut session = Session::new(quote_config(&source));
        type_through(&mut session, &mut history, 100);
    }

    assert_eq!(history.len(), HISTORY_CAPACITY);
    // newest first: the last round typed the longest text
    assert_eq!(
        history.entries()[0].text_length,
        2 * (HISTORY_CAPACITY + 1)
    );
    // the very first session (text length 2) has been evicted
    assert!(history.entries().iter().all(|r| r.text_length != 2));
}

#[test]
fn pause_does_not_stop_the_wall_clock() {
    let mut session = Session::new(quote_config("pause me"));
    session.start(0);
    session.apply_input("pa", 1_000);

    session.pause();
    assert_eq!(session.phase(), Phase::Paused);

    // a minute passes while paused; input during the pause is dropped
    session.apply_input("paus", 30_000);
    assert_eq!(session.state.typed, "pa");

    session.resume(61_000);
    let update = session.apply_input("pau", 61_500);
    assert!(update.completed.is_none());
    assert_eq!(update.stats.elapsed_seconds, 61.5);
}

#[test]
fn reset_then_start_is_a_fresh_session() {
    let mut session = Session::new(quote_config("restart"));
    session.start(0);
    session.apply_input("res", 1_000);

    session.reset();
    assert_eq!(session.phase(), Phase::Idle);

    session.start(5_000);
    assert_eq!(session.phase(), Phase::Active);
    assert!(session.state.typed.is_empty());
    assert_eq!(session.elapsed_seconds(6_000), 1.0);
}

#[test]
fn completed_session_rejects_further_input() {
    let mut session = Session::new(quote_config("done"));
    let mut history = ResultHistory::new();
    type_through(&mut session, &mut history, 100);

    let before = session.state.typed.clone();
    let update = session.apply_input("done and more", 10_000);
    assert!(update.completed.is_none());
    assert_eq!(session.state.typed, before);
    assert_eq!(history.len(), 1);
}

#[test]
fn wpm_samples_feed_consistency() {
    // type steadily for ~7 seconds so several even-second samples land
    let source = "the quick brown fox jumps over the lazy dog and runs on";
    let mut session = Session::new(quote_config(source));
    session.start(0);

    let mut buffer = String::new();
    let mut last_update = None;
    for (i, c) in source.chars().enumerate() {
        buffer.push(c);
        let now_ms = (i as u64 + 1) * 125;
        let update = session.apply_input(&buffer, now_ms);
        let done = update.completed.is_some();
        last_update = Some(update);
        if done {
            break;
        }
    }

    assert!(session.state.samples.len() >= 2);
    let stats = last_update.unwrap().stats;
    assert!((0.0..=100.0).contains(&stats.consistency_percent));
}
