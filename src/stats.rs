use serde::{Deserialize, Serialize};

/// Letters per word in the WPM convention.
const LETTERS_PER_WORD: f64 = 5.0;

/// Keystroke-level counters. The `current_word_*` fields restart with
/// every word; the totals only move back to zero on a practice reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterStats {
    pub total_input_letters: u32,
    pub total_correct_letters: u32,
    pub total_wrong_letters: u32,
    pub current_word_input_letters: u32,
    pub current_word_correct_letters: u32,
    pub current_word_wrong_letters: u32,
}

impl LetterStats {
    pub fn record_correct(&mut self) {
        self.current_word_input_letters += 1;
        self.current_word_correct_letters += 1;
        self.total_input_letters += 1;
        self.total_correct_letters += 1;
    }

    pub fn record_wrong(&mut self) {
        self.current_word_input_letters += 1;
        self.current_word_wrong_letters += 1;
        self.total_input_letters += 1;
        self.total_wrong_letters += 1;
    }

    pub fn begin_word(&mut self) {
        self.current_word_input_letters = 0;
        self.current_word_correct_letters = 0;
        self.current_word_wrong_letters = 0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Word-level counters. `answered_count` moves once per resolved word,
/// `correct_count` once per completed word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCounters {
    pub correct_count: u32,
    pub answered_count: u32,
    #[serde(rename = "currentWPM")]
    pub current_wpm: u32,
}

impl SessionCounters {
    pub fn record_completed(&mut self) {
        self.correct_count += 1;
        self.answered_count += 1;
    }

    pub fn record_skipped(&mut self) {
        self.answered_count += 1;
    }

    pub fn correct_rate(&self) -> u32 {
        correct_rate(self.correct_count, self.answered_count)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// Completed words over resolved words. Mistakes inside a word don't count.
pub fn correct_rate(correct_count: u32, answered_count: u32) -> u32 {
    percent(correct_count, answered_count)
}

/// Keystroke accuracy: (all keystrokes - wrong keystrokes) / all keystrokes.
pub fn letter_accuracy(stats: &LetterStats) -> u32 {
    percent(
        stats
            .total_input_letters
            .saturating_sub(stats.total_wrong_letters),
        stats.total_input_letters,
    )
}

/// Accuracy reported on chapter completion: correct keystrokes / all keystrokes.
pub fn chapter_accuracy(stats: &LetterStats) -> u32 {
    percent(stats.total_correct_letters, stats.total_input_letters)
}

pub fn average_wpm(correct_letters: u32, elapsed_secs: u64) -> u32 {
    wpm(correct_letters, elapsed_secs as f64)
}

/// Typing speed for a single word, from its start/end stamps.
pub fn word_wpm(letters: u32, duration_ms: i64) -> u32 {
    wpm(letters, duration_ms.max(0) as f64 / 1000.0)
}

fn wpm(letters: u32, secs: f64) -> u32 {
    if secs <= 0.0 {
        return 0;
    }
    ((letters as f64 / LETTERS_PER_WORD) / (secs / 60.0)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_rate() {
        assert_eq!(correct_rate(0, 0), 0);
        assert_eq!(correct_rate(1, 1), 100);
        assert_eq!(correct_rate(0, 3), 0);
        assert_eq!(correct_rate(2, 3), 67);
    }

    #[test]
    fn test_letter_accuracy() {
        let stats = LetterStats {
            total_input_letters: 8,
            total_correct_letters: 6,
            total_wrong_letters: 2,
            ..Default::default()
        };
        assert_eq!(letter_accuracy(&stats), 75);
        assert_eq!(letter_accuracy(&LetterStats::default()), 0);
    }

    #[test]
    fn test_letter_accuracy_differs_from_correct_rate() {
        // one word completed after a miss: 100% of words, 5/6 keystrokes
        let mut stats = LetterStats::default();
        stats.record_wrong();
        for _ in 0..5 {
            stats.record_correct();
        }
        let mut counters = SessionCounters::default();
        counters.record_completed();

        assert_eq!(counters.correct_rate(), 100);
        assert_eq!(letter_accuracy(&stats), 83);
    }

    #[test]
    fn test_average_wpm() {
        assert_eq!(average_wpm(50, 0), 0);
        // 50 letters = 10 words in one minute
        assert_eq!(average_wpm(50, 60), 10);
        // 25 letters in 30 seconds
        assert_eq!(average_wpm(25, 30), 10);
        assert_eq!(average_wpm(7, 60), 1);
    }

    #[test]
    fn test_word_wpm() {
        assert_eq!(word_wpm(5, 0), 0);
        assert_eq!(word_wpm(5, 1000), 60);
        assert_eq!(word_wpm(5, -10), 0);
    }

    #[test]
    fn test_begin_word_keeps_totals() {
        let mut stats = LetterStats::default();
        stats.record_correct();
        stats.record_wrong();
        stats.begin_word();

        assert_eq!(stats.current_word_input_letters, 0);
        assert_eq!(stats.current_word_wrong_letters, 0);
        assert_eq!(stats.total_input_letters, 2);
        assert_eq!(stats.total_correct_letters, 1);
        assert_eq!(stats.total_wrong_letters, 1);

        stats.reset();
        assert_eq!(stats, LetterStats::default());
    }

    #[test]
    fn test_skip_never_counts_as_correct() {
        let mut counters = SessionCounters::default();
        for _ in 0..3 {
            counters.record_skipped();
        }
        assert_eq!(counters.answered_count, 3);
        assert_eq!(counters.correct_count, 0);
        assert_eq!(counters.correct_rate(), 0);
    }
}
