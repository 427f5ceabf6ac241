use tracing::trace;

use crate::notebook::WrongWordEntry;
use crate::provider::PracticeResult;
use crate::session::{
    after, SessionEvent, TypingSession, WORD_ADVANCE_DELAY_MS, WRONG_CLEAR_DELAY_MS,
};
use crate::stats;
use crate::time_series::TimeSeriesPoint;
use crate::timer::Timestamp;

impl TypingSession {
    /// Judge one typed character against the current position.
    ///
    /// Keys are ignored before the run starts, while paused, once the word
    /// is finished and after the chapter is done. A key pressed while a
    /// wrong letter is still highlighted restarts the word first and is then
    /// judged against its first character.
    pub fn handle_key(&mut self, typed: char, now: Timestamp) {
        if !self.started || self.timer.is_paused() || self.completion.is_completed() {
            return;
        }
        if self.word_state.is_finished() {
            return;
        }
        if self.word_state.has_wrong() {
            self.clear_pending_wrong();
        }

        let Some(expected) = self.word_state.target_char() else {
            return;
        };
        let position = self.word_state.position();
        self.timer.tick(now);

        if typed == expected {
            let finished = self.word_state.accept(now);
            self.letter_stats.record_correct();
            self.events
                .push_back(SessionEvent::CorrectKey { expected, position });
            if finished {
                self.complete_word(now);
            }
        } else {
            trace!(%expected, %typed, position, "wrong key");
            self.word_state.reject();
            self.letter_stats.record_wrong();
            self.mistakes.record(expected, typed);
            self.wrong_clear_due = Some(after(now, WRONG_CLEAR_DELAY_MS));
            self.events.push_back(SessionEvent::WrongKey {
                expected,
                typed,
                position,
            });
        }
        self.refresh_wpm();
    }

    /// Give up on the current word. It counts as answered but not correct,
    /// and goes straight to the next word without the advance delay.
    pub fn skip_word(&mut self, now: Timestamp) {
        if !self.started || self.timer.is_paused() || self.completion.is_completed() {
            return;
        }
        if self.word_state.is_finished() {
            return;
        }

        self.counters.record_skipped();
        let duration_ms = self
            .word_state
            .start_time()
            .map_or(0, |start| (now - start).num_milliseconds().max(0));
        let typed_letters = self.word_state.position() as u32;
        self.queue_result(false, typed_letters, duration_ms, now);
        self.events.push_back(SessionEvent::WordSkipped {
            index: self.current_index,
            word: self.word_state.display_word().to_string(),
        });
        self.timer.tick(now);
        self.refresh_wpm();
        self.advance(now);
    }

    fn complete_word(&mut self, now: Timestamp) {
        self.counters.record_completed();
        let word = self.words[self.current_index].clone();
        let wrong_count = self.word_state.wrong_count();
        let had_mistakes = wrong_count > 0;

        if had_mistakes {
            self.data.wrong_words_notebook.add_wrong_word(WrongWordEntry::new(
                word.word.clone(),
                word.translation.clone().unwrap_or_default(),
                self.dictionary.clone(),
                self.chapter,
                now,
            ));
            if !self.touched_words.contains(&word.word) {
                self.touched_words.push(word.word.clone());
            }
        }

        let duration_ms = self.word_state.duration_ms().unwrap_or(0);
        self.queue_result(true, word.len() as u32, duration_ms, now);

        self.refresh_wpm();
        self.wpm_history.push(TimeSeriesPoint::new(
            self.timer.elapsed_secs() as f64,
            self.counters.current_wpm as f64,
        ));
        self.events.push_back(SessionEvent::WordCompleted {
            index: self.current_index,
            word: word.word,
            had_mistakes,
        });
        self.advance_due = Some(after(now, WORD_ADVANCE_DELAY_MS));
    }

    fn queue_result(&mut self, is_correct: bool, letters: u32, duration_ms: i64, now: Timestamp) {
        self.pending_results.push(PracticeResult {
            word_id: self.words[self.current_index].id.clone(),
            is_correct,
            mistakes: self.mistakes.word_mistakes().clone(),
            wrong_count: self.word_state.wrong_count(),
            typing_speed: stats::word_wpm(letters, duration_ms),
            response_time: duration_ms as u64,
            submitted_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::session::{
        after, SessionEvent, TypingSession, WORD_ADVANCE_DELAY_MS, WRONG_CLEAR_DELAY_MS,
    };
    use crate::store::PracticeData;
    use crate::timer::Timestamp;
    use crate::word::Word;
    use crate::word_state::{LetterState, WordPhase};
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at_ms(ms: i64) -> Timestamp {
        after(t0(), ms)
    }

    fn session(list: &[&str]) -> TypingSession {
        let words = list
            .iter()
            .enumerate()
            .map(|(i, w)| Word::new(format!("w{i}"), *w).with_translation(format!("t-{w}")))
            .collect();
        let mut s = TypingSession::new("cet4", 1, words, PracticeData::default()).unwrap();
        s.start(t0());
        s.drain_events();
        s
    }

    fn type_word(s: &mut TypingSession, word: &str, now: Timestamp) {
        for c in word.chars() {
            s.handle_key(c, now);
        }
    }

    #[test]
    fn test_correct_keys_finish_word() {
        let mut s = session(&["cat"]);
        type_word(&mut s, "cat", at_ms(600));

        let ws = s.word_state();
        assert!(ws.is_finished());
        assert_eq!(ws.input_word(), "cat");
        assert_eq!(ws.letter_states(), &[LetterState::Correct; 3]);
        assert_eq!(ws.phase(), WordPhase::Finished);
        assert_eq!(s.counters().correct_count, 1);
        assert_eq!(s.counters().answered_count, 1);
        assert_eq!(s.letter_stats().total_correct_letters, 3);
    }

    #[test]
    fn test_wrong_key_marks_position_only() {
        let mut s = session(&["cat"]);
        s.handle_key('c', at_ms(10));
        s.handle_key('x', at_ms(20));

        let ws = s.word_state();
        assert_eq!(ws.input_word(), "c");
        assert_eq!(
            ws.letter_states(),
            &[LetterState::Correct, LetterState::Wrong, LetterState::Normal]
        );
        assert!(ws.has_wrong());
        assert_eq!(ws.wrong_count(), 1);
        assert_eq!(s.key_mistakes()[&'a'], vec!['a']);
        assert_eq!(s.letter_stats().total_wrong_letters, 1);
        assert_eq!(
            s.drain_events().last(),
            Some(&SessionEvent::WrongKey {
                expected: 'a',
                typed: 'x',
                position: 1,
            })
        );
    }

    #[test]
    fn test_wrong_flash_clears_after_delay() {
        let mut s = session(&["cat"]);
        s.handle_key('c', at_ms(10));
        s.handle_key('x', at_ms(20));

        s.tick(at_ms(20 + WRONG_CLEAR_DELAY_MS - 1));
        assert!(s.word_state().has_wrong());

        s.tick(at_ms(20 + WRONG_CLEAR_DELAY_MS));
        let ws = s.word_state();
        assert!(!ws.has_wrong());
        assert_eq!(ws.input_word(), "");
        assert_eq!(ws.letter_states(), &[LetterState::Normal; 3]);
        // the count survives the restart
        assert_eq!(ws.wrong_count(), 1);
    }

    #[test]
    fn test_key_during_flash_restarts_word() {
        let mut s = session(&["hi"]);
        s.handle_key('x', at_ms(10));
        s.handle_key('h', at_ms(20));
        s.handle_key('i', at_ms(30));

        assert!(s.word_state().is_finished());
        assert_eq!(s.counters().correct_count, 1);
        assert_eq!(s.counters().answered_count, 1);
        assert_eq!(s.correct_rate(), 100);
    }

    #[test]
    fn test_key_during_flash_judged_against_first_letter() {
        let mut s = session(&["cat"]);
        s.handle_key('c', at_ms(10));
        s.handle_key('x', at_ms(20));
        // 'a' would have been right before the restart
        s.handle_key('a', at_ms(30));

        assert_eq!(s.word_state().input_word(), "");
        assert_eq!(s.key_mistakes()[&'c'], vec!['c']);
    }

    #[test]
    fn test_keys_ignored_after_word_finished() {
        let mut s = session(&["ab", "cd"]);
        type_word(&mut s, "ab", at_ms(10));
        s.handle_key('c', at_ms(20));

        assert_eq!(s.current_index(), 0);
        assert_eq!(s.letter_stats().total_input_letters, 2);
    }

    #[test]
    fn test_keys_ignored_before_start() {
        let words = vec![Word::new("1", "ab")];
        let mut s = TypingSession::new("cet4", 1, words, PracticeData::default()).unwrap();
        s.handle_key('a', t0());
        assert_eq!(s.letter_stats().total_input_letters, 0);
    }

    #[test]
    fn test_mistyped_word_goes_to_notebook() {
        let mut s = session(&["cat", "dog"]);
        s.handle_key('x', at_ms(10));
        type_word(&mut s, "cat", at_ms(20));
        s.tick(at_ms(20 + WORD_ADVANCE_DELAY_MS));
        type_word(&mut s, "dog", at_ms(1000));

        let notebook = &s.data().wrong_words_notebook;
        assert_eq!(notebook.len(), 1);
        let entry = notebook.get("cat").unwrap();
        assert_eq!(entry.translation, "t-cat");
        assert_eq!(entry.dictionary, "cet4");
        assert_eq!(entry.chapter, 1);
        assert_eq!(entry.error_count, 1);
    }

    #[test]
    fn test_result_queued_per_completed_word() {
        let mut s = session(&["cat"]);
        s.handle_key('c', at_ms(0));
        s.handle_key('v', at_ms(100));
        type_word(&mut s, "cat", at_ms(1200));

        let results = s.pending_results();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.word_id, "w0");
        assert!(r.is_correct);
        assert_eq!(r.wrong_count, 1);
        assert_eq!(r.mistakes[&'a'], vec!['a']);
        assert_eq!(r.response_time, 1200);
        // 3 letters in 1.2s
        assert_eq!(r.typing_speed, 30);
    }

    #[test]
    fn test_skip_counts_answered_only() {
        let mut s = session(&["one", "two", "three", "four"]);
        s.skip_word(at_ms(10));
        s.skip_word(at_ms(20));
        s.skip_word(at_ms(30));

        assert_eq!(s.counters().answered_count, 3);
        assert_eq!(s.counters().correct_count, 0);
        assert_eq!(s.correct_rate(), 0);
        assert_eq!(s.current_index(), 3);
        assert!(s.data().wrong_words_notebook.is_empty());
        let results = s.pending_results();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.is_correct));
    }

    #[test]
    fn test_skip_ignored_once_word_finished() {
        let mut s = session(&["ab", "cd"]);
        type_word(&mut s, "ab", at_ms(10));
        s.skip_word(at_ms(20));

        assert_eq!(s.counters().answered_count, 1);
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn test_skip_last_word_completes_chapter() {
        let mut s = session(&["ab"]);
        s.skip_word(at_ms(5000));

        assert!(s.is_chapter_completed());
        let data = s.completion().data().unwrap();
        assert_eq!(data.practice_time, 5);
        assert!(data.wrong_words.is_empty());
    }

    #[test]
    fn test_wpm_history_point_per_word() {
        let mut s = session(&["abcde", "fghij"]);
        type_word(&mut s, "abcde", at_ms(30_000));
        s.tick(at_ms(30_500));
        type_word(&mut s, "fghij", at_ms(60_000));

        let history = s.wpm_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].t, 30.0);
        assert_eq!(history[0].wpm, 2.0);
        assert_eq!(history[1].t, 60.0);
        assert_eq!(history[1].wpm, 2.0);
    }
}
