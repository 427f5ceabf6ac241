use serde::{Deserialize, Serialize};

use crate::notebook::{WrongWordEntry, WrongWordsNotebook};
use crate::stats::{average_wpm, chapter_accuracy, LetterStats};

/// Summary of a finished chapter, handed to the UI and the progress tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterCompletionData {
    pub accuracy: u32,
    /// Seconds.
    pub practice_time: u64,
    pub wpm: u32,
    pub wrong_words: Vec<WrongWordEntry>,
    pub dictionary: String,
    pub chapter: u32,
}

/// Build the completion record from the run's letter totals and the
/// notebook entries for words mistyped during this chapter.
pub fn generate_chapter_completion(
    letter_stats: &LetterStats,
    session_secs: u64,
    notebook: &WrongWordsNotebook,
    touched_words: &[String],
    dictionary: &str,
    chapter: u32,
) -> ChapterCompletionData {
    let wrong_words = touched_words
        .iter()
        .filter_map(|w| notebook.get(w).cloned())
        .collect();

    ChapterCompletionData {
        accuracy: chapter_accuracy(letter_stats),
        practice_time: session_secs,
        wpm: average_wpm(letter_stats.total_correct_letters, session_secs),
        wrong_words,
        dictionary: dictionary.to_string(),
        chapter,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterCompletion {
    chapter_completed: bool,
    data: Option<ChapterCompletionData>,
}

impl ChapterCompletion {
    pub fn mark_chapter_completed(&mut self, data: ChapterCompletionData) {
        self.chapter_completed = true;
        self.data = Some(data);
    }

    pub fn reset_chapter_completion(&mut self) {
        self.chapter_completed = false;
        self.data = None;
    }

    pub fn is_completed(&self) -> bool {
        self.chapter_completed
    }

    pub fn data(&self) -> Option<&ChapterCompletionData> {
        self.data.as_ref()
    }
}
