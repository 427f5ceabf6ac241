use serde::{Deserialize, Serialize};

use crate::timer::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LetterState {
    Normal,
    Correct,
    Wrong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum WordPhase {
    Idle,
    Typing,
    WrongFlash,
    Finished,
}

/// The word currently being typed.
///
/// `input_word` is always a prefix of `display_word` and `letter_states`
/// always has one entry per character of `display_word`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordState {
    display_word: String,
    input_word: String,
    letter_states: Vec<LetterState>,
    is_finished: bool,
    has_wrong: bool,
    correct_count: u32,
    wrong_count: u32,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    #[serde(skip)]
    target: Vec<char>,
}

impl WordState {
    pub fn new(word: &str, now: Timestamp) -> Self {
        let mut state = Self::default();
        state.init_word(word, now);
        state
    }

    /// The only place the position counter goes back to zero for a new word.
    pub fn init_word(&mut self, word: &str, now: Timestamp) {
        self.target = word.chars().collect();
        self.display_word = word.to_string();
        self.input_word.clear();
        self.letter_states = vec![LetterState::Normal; self.target.len()];
        self.is_finished = false;
        self.has_wrong = false;
        self.correct_count = 0;
        self.wrong_count = 0;
        self.start_time = Some(now);
        self.end_time = None;
    }

    pub fn position(&self) -> usize {
        self.input_word.chars().count()
    }

    pub fn target_char(&self) -> Option<char> {
        self.target.get(self.position()).copied()
    }

    /// Append the expected character. Returns true when this completed the word.
    pub fn accept(&mut self, now: Timestamp) -> bool {
        let position = self.position();
        let Some(expected) = self.target.get(position).copied() else {
            return self.is_finished;
        };

        self.input_word.push(expected);
        self.letter_states[position] = LetterState::Correct;
        self.correct_count += 1;

        if position + 1 == self.target.len() {
            self.is_finished = true;
            self.end_time = Some(now);
        }
        self.is_finished
    }

    /// Mark only the current position wrong. The input is left untouched.
    pub fn reject(&mut self) {
        let position = self.position();
        if let Some(state) = self.letter_states.get_mut(position) {
            *state = LetterState::Wrong;
        }
        self.has_wrong = true;
        self.wrong_count += 1;
    }

    /// Restart the word from its first character.
    pub fn clear_wrong(&mut self) {
        self.input_word.clear();
        self.letter_states.fill(LetterState::Normal);
        self.has_wrong = false;
    }

    pub fn phase(&self) -> WordPhase {
        if self.is_finished {
            WordPhase::Finished
        } else if self.has_wrong {
            WordPhase::WrongFlash
        } else if self.start_time.is_none() {
            WordPhase::Idle
        } else {
            WordPhase::Typing
        }
    }

    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds().max(0)),
            _ => None,
        }
    }

    pub fn display_word(&self) -> &str {
        &self.display_word
    }

    pub fn input_word(&self) -> &str {
        &self.input_word
    }

    pub fn letter_states(&self) -> &[LetterState] {
        &self.letter_states
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    pub fn has_wrong(&self) -> bool {
        self.has_wrong
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_default_is_idle() {
        let state = WordState::default();
        assert_eq!(state.phase(), WordPhase::Idle);
        assert!(state.letter_states().is_empty());
    }

    #[test]
    fn test_init_word_allocates_normal_letters() {
        let state = WordState::new("hello", t0());

        assert_eq!(state.display_word(), "hello");
        assert_eq!(state.input_word(), "");
        assert_eq!(state.letter_states().len(), 5);
        assert!(state
            .letter_states()
            .iter()
            .all(|s| *s == LetterState::Normal));
        assert_eq!(state.phase(), WordPhase::Typing);
        assert_eq!(state.start_time(), Some(t0()));
    }

    #[test]
    fn test_init_word_counts_chars_not_bytes() {
        let state = WordState::new("naïve", t0());
        assert_eq!(state.letter_states().len(), 5);
        assert_eq!(state.target_char(), Some('n'));
    }

    #[test]
    fn test_accept_until_finished() {
        let mut state = WordState::new("hi", t0());

        assert!(!state.accept(t0()));
        assert_eq!(state.input_word(), "h");
        assert_eq!(state.letter_states()[0], LetterState::Correct);

        let end = t0() + Duration::milliseconds(400);
        assert!(state.accept(end));
        assert!(state.is_finished());
        assert_eq!(state.end_time(), Some(end));
        assert_eq!(state.duration_ms(), Some(400));
        assert_eq!(state.phase(), WordPhase::Finished);
    }

    #[test]
    fn test_reject_marks_only_current_position() {
        let mut state = WordState::new("cat", t0());
        state.accept(t0());
        state.reject();

        assert_eq!(
            state.letter_states(),
            &[LetterState::Correct, LetterState::Wrong, LetterState::Normal]
        );
        assert_eq!(state.input_word(), "c");
        assert!(state.has_wrong());
        assert_eq!(state.wrong_count(), 1);
        assert_eq!(state.phase(), WordPhase::WrongFlash);
    }

    #[test]
    fn test_clear_wrong_restarts_word() {
        let mut state = WordState::new("cat", t0());
        state.accept(t0());
        state.reject();
        state.clear_wrong();

        assert_eq!(state.input_word(), "");
        assert_eq!(state.position(), 0);
        assert!(!state.has_wrong());
        assert!(state
            .letter_states()
            .iter()
            .all(|s| *s == LetterState::Normal));
        // per-word counters survive the restart
        assert_eq!(state.correct_count(), 1);
        assert_eq!(state.wrong_count(), 1);
    }

    #[test]
    fn test_letter_state_display() {
        assert_eq!(LetterState::Wrong.to_string(), "wrong");
        assert_eq!(
            serde_json::to_string(&LetterState::Correct).unwrap(),
            "\"correct\""
        );
    }
}
