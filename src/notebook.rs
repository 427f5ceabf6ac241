use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::timer::Timestamp;

/// A word that was mistyped at least once. Unique by `word`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongWordEntry {
    pub word: String,
    pub translation: String,
    pub dictionary: String,
    pub chapter: u32,
    pub error_count: u32,
    pub last_error_time: Timestamp,
}

impl WrongWordEntry {
    pub fn new(
        word: impl Into<String>,
        translation: impl Into<String>,
        dictionary: impl Into<String>,
        chapter: u32,
        now: Timestamp,
    ) -> Self {
        Self {
            word: word.into(),
            translation: translation.into(),
            dictionary: dictionary.into(),
            chapter,
            error_count: 1,
            last_error_time: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookStats {
    pub total_words: usize,
    pub total_errors: u32,
    pub dictionary_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrongWordsNotebook {
    entries: Vec<WrongWordEntry>,
}

impl WrongWordsNotebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry with an error count of one, or bump the count and
    /// refresh `last_error_time` of the existing entry for the same word.
    pub fn add_wrong_word(&mut self, entry: WrongWordEntry) -> &WrongWordEntry {
        match self.entries.iter().position(|e| e.word == entry.word) {
            Some(idx) => {
                let existing = &mut self.entries[idx];
                existing.error_count = existing.error_count.saturating_add(1);
                existing.last_error_time = entry.last_error_time;
                existing
            }
            None => {
                self.entries.push(WrongWordEntry {
                    error_count: 1,
                    ..entry
                });
                let last = self.entries.len() - 1;
                &self.entries[last]
            }
        }
    }

    pub fn remove_wrong_word(&mut self, word: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.word != word);
        self.entries.len() != before
    }

    pub fn clear_wrong_words_notebook(&mut self) {
        self.entries.clear();
    }

    pub fn get_wrong_words_notebook_stats(&self) -> NotebookStats {
        NotebookStats {
            total_words: self.entries.len(),
            total_errors: self.entries.iter().map(|e| e.error_count).sum(),
            dictionary_count: self.entries.iter().map(|e| &e.dictionary).unique().count(),
        }
    }

    pub fn get(&self, word: &str) -> Option<&WrongWordEntry> {
        self.entries.iter().find(|e| e.word == word)
    }

    pub fn entries(&self) -> &[WrongWordEntry] {
        &self.entries
    }

    /// Entries with the highest error counts first, most recent first on ties.
    pub fn most_missed(&self, limit: usize) -> Vec<&WrongWordEntry> {
        self.entries
            .iter()
            .sorted_by(|a, b| {
                b.error_count
                    .cmp(&a.error_count)
                    .then(b.last_error_time.cmp(&a.last_error_time))
            })
            .take(limit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
