// End-to-end practice rules exercised through the public session API.

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use spellkey::daily::DailyPracticeDuration;
use spellkey::progress::ChapterPracticeStats;
use spellkey::session::{WORD_ADVANCE_DELAY_MS, WRONG_CLEAR_DELAY_MS};
use spellkey::store::PracticeData;
use spellkey::timer::Timestamp;
use spellkey::word::Word;
use spellkey::word_state::{LetterState, WordState};
use spellkey::TypingSession;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn session(list: &[&str]) -> TypingSession {
    let words = list
        .iter()
        .enumerate()
        .map(|(i, w)| Word::new(i.to_string(), *w))
        .collect();
    let mut s = TypingSession::new("cet4", 1, words, PracticeData::default()).unwrap();
    s.start(t0());
    s
}

fn press(s: &mut TypingSession, keys: &str) {
    for c in keys.chars() {
        s.handle_key(c, t0());
    }
}

#[test]
fn init_word_sets_all_letters_normal() {
    for word in ["a", "hello", "naïve", "dépôt"] {
        let ws = WordState::new(word, t0());
        assert_eq!(ws.letter_states().len(), word.chars().count());
        assert!(ws.letter_states().iter().all(|s| *s == LetterState::Normal));
    }
}

#[test]
fn input_is_always_a_prefix_of_the_word() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut s = session(&["practice"]);
    let mut now = t0();

    for _ in 0..500 {
        let target = s.word_state().display_word().to_string();
        let c = if rng.gen_bool(0.6) {
            s.word_state().target_char().unwrap_or('p')
        } else {
            rng.gen_range('a'..='z')
        };
        s.handle_key(c, now);
        assert!(target.starts_with(s.word_state().input_word()));

        now += Duration::milliseconds(rng.gen_range(0..1500));
        s.tick(now);
        if s.is_chapter_completed() {
            break;
        }
    }
}

#[test]
fn mistakes_inside_a_word_do_not_lower_word_accuracy() {
    let mut with_mistake = session(&["hi"]);
    press(&mut with_mistake, "xhi");

    let mut clean = session(&["hi"]);
    press(&mut clean, "hi");

    for s in [&with_mistake, &clean] {
        assert_eq!(s.counters().correct_count, 1);
        assert_eq!(s.counters().answered_count, 1);
        assert_eq!(s.correct_rate(), 100);
    }
}

#[test]
fn three_skips_give_zero_correct_rate() {
    let mut s = session(&["one", "two", "three"]);
    for _ in 0..3 {
        s.skip_word(t0());
    }
    assert_eq!(s.counters().answered_count, 3);
    assert_eq!(s.counters().correct_count, 0);
    assert_eq!(s.correct_rate(), 0);
}

#[test]
fn repeated_misses_on_first_letter_accumulate() {
    let mut s = session(&["hello"]);
    press(&mut s, "xyz");
    assert_eq!(s.key_mistakes()[&'h'].len(), 3);
}

#[test]
fn hello_scenario_records_expected_char() {
    let mut s = session(&["hello"]);
    press(&mut s, "xhello");

    assert!(s.word_state().is_finished());
    assert_eq!(s.key_mistakes()[&'h'], vec!['h']);
    assert_eq!(s.correct_rate(), 100);
}

#[test]
fn practice_count_display_caps_at_999() {
    let mut stats = ChapterPracticeStats::new();
    stats.set_chapter_practice_count("cet4", 1, 999);
    assert_eq!(stats.get_chapter_practice_count_display("cet4", 1), "999");
    stats.increment_chapter_practice_count("cet4", 1);
    assert_eq!(stats.get_chapter_practice_count_display("cet4", 1), "999+");
}

#[test]
fn daily_practice_duration_accumulates_and_resets() {
    let mut daily = DailyPracticeDuration::default();
    daily.record_practice_session(300, t0());
    daily.record_practice_session(600, t0());
    assert_eq!(daily.total_seconds, 900);
    assert_eq!(daily.sessions.len(), 2);

    daily.reset_daily_practice_duration();
    assert_eq!(daily.total_seconds, 0);
    assert!(daily.sessions.is_empty());
}

#[test]
fn reset_practice_clears_session_but_not_cumulative_mistakes() {
    let mut s = session(&["hello", "world"]);
    press(&mut s, "xhello");
    s.tick(t0() + Duration::milliseconds(WORD_ADVANCE_DELAY_MS));
    s.skip_word(t0());

    s.reset_practice(t0());

    assert_eq!(s.counters().correct_count, 0);
    assert_eq!(s.counters().answered_count, 0);
    let ls = s.letter_stats();
    assert_eq!(
        (
            ls.total_input_letters,
            ls.total_correct_letters,
            ls.total_wrong_letters,
            ls.current_word_input_letters,
            ls.current_word_correct_letters,
            ls.current_word_wrong_letters,
        ),
        (0, 0, 0, 0, 0, 0)
    );
    assert!(s.key_mistakes().is_empty());
    assert_eq!(s.cumulative_key_mistakes()[&'h'], vec!['h']);
}

#[test]
fn key_after_finish_before_advance_is_ignored() {
    let mut s = session(&["ab", "cd"]);
    press(&mut s, "ab");
    press(&mut s, "c");
    s.tick(t0() + Duration::milliseconds(WORD_ADVANCE_DELAY_MS - 1));

    assert_eq!(s.current_index(), 0);
    assert_eq!(s.word_state().input_word(), "ab");
    assert_eq!(s.letter_stats().total_input_letters, 2);
}

#[test]
fn wrong_state_clears_after_delay() {
    let mut s = session(&["ab"]);
    press(&mut s, "ax");
    assert!(s.word_state().has_wrong());

    s.tick(t0() + Duration::milliseconds(WRONG_CLEAR_DELAY_MS));
    assert!(!s.word_state().has_wrong());
    assert_eq!(s.word_state().input_word(), "");
}

#[test]
fn practice_data_survives_a_chapter() {
    let mut s = session(&["ab"]);
    press(&mut s, "xab");
    s.tick(t0() + Duration::seconds(90));

    let data = s.into_data();
    assert_eq!(
        data.chapter_practice_stats
            .get_chapter_practice_count("cet4", 1),
        1
    );
    assert_eq!(data.daily_practice_duration.total_seconds, 90);
    let stats = data.wrong_words_notebook.get_wrong_words_notebook_stats();
    assert_eq!(stats.total_words, 1);
    assert_eq!(stats.total_errors, 1);
    assert_eq!(stats.dictionary_count, 1);
}
