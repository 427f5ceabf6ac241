use chrono::{Duration, NaiveDate};
use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::daily::DailyProgressPoint;
use crate::error::{PracticeError, Result};
use crate::mistakes::MistakeMap;
use crate::progress::ChapterPracticeStats;
use crate::timer::Timestamp;
use crate::word::Word;

static DICTIONARY_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/dictionaries");

pub const DEFAULT_MAX_LOAD_RETRIES: u32 = 3;

/// Outcome of one word, sent to the provider after the word resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeResult {
    pub word_id: String,
    pub is_correct: bool,
    pub mistakes: MistakeMap,
    pub wrong_count: u32,
    /// WPM for this word alone.
    pub typing_speed: u32,
    /// Milliseconds from the word appearing to its last correct key, or to
    /// the skip.
    pub response_time: u64,
    pub submitted_at: Timestamp,
}

/// Boundary to whatever owns word lists and remote progress.
pub trait PracticeDataProvider {
    fn fetch_words(&mut self, dictionary: &str, chapter: u32) -> Result<Vec<Word>>;
    fn submit_practice_result(&mut self, result: &PracticeResult) -> Result<()>;
    fn get_chapter_stats(&mut self) -> Result<ChapterPracticeStats>;
    fn update_chapter_stats(&mut self, stats: &ChapterPracticeStats) -> Result<()>;
    /// The last `days` days up to and including `today`.
    fn get_daily_progress(
        &mut self,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<DailyProgressPoint>>;
}

/// Fetch a chapter's words, retrying up to `max_attempts` times.
///
/// `on_warning` is called after every failed attempt so the host can tell
/// the user. Blank words are dropped; a list that ends up empty is an
/// [`PracticeError::EmptyWordList`].
pub fn load_words_with_retry<F>(
    provider: &mut dyn PracticeDataProvider,
    dictionary: &str,
    chapter: u32,
    max_attempts: u32,
    mut on_warning: F,
) -> Result<Vec<Word>>
where
    F: FnMut(&PracticeError, u32),
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match provider.fetch_words(dictionary, chapter) {
            Ok(words) => {
                let total = words.len();
                let words: Vec<Word> = words.into_iter().filter(Word::is_typeable).collect();
                if words.len() != total {
                    warn!(
                        dictionary,
                        chapter,
                        dropped = total - words.len(),
                        "dropped blank words"
                    );
                }
                if words.is_empty() {
                    return Err(PracticeError::EmptyWordList {
                        dictionary: dictionary.to_string(),
                        chapter,
                    });
                }
                return Ok(words);
            }
            Err(e) => {
                warn!(
                    dictionary,
                    chapter,
                    attempt,
                    max_attempts,
                    error = %e,
                    "word list fetch failed"
                );
                on_warning(&e, attempt);
                last_error = Some(e);
            }
        }
    }

    Err(PracticeError::DataLoad {
        dictionary: dictionary.to_string(),
        chapter,
        attempts: max_attempts,
        message: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// A word list shipped with the binary.
#[derive(Deserialize, Clone, Debug)]
pub struct Dictionary {
    pub id: String,
    pub name: String,
    pub chapter_size: usize,
    pub words: Vec<Word>,
}

impl Dictionary {
    pub fn load(id: &str) -> Result<Self> {
        let file = DICTIONARY_DIR
            .get_file(format!("{id}.json"))
            .ok_or_else(|| PracticeError::UnknownDictionary(id.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| PracticeError::UnknownDictionary(id.to_string()))?;
        Ok(serde_json::from_str(contents)?)
    }

    pub fn chapter_count(&self) -> u32 {
        if self.chapter_size == 0 {
            return 0;
        }
        self.words.len().div_ceil(self.chapter_size) as u32
    }

    /// Chapters are numbered from 1.
    pub fn chapter(&self, chapter: u32) -> Option<&[Word]> {
        if chapter == 0 || chapter > self.chapter_count() {
            return None;
        }
        let start = (chapter as usize - 1) * self.chapter_size;
        let end = (start + self.chapter_size).min(self.words.len());
        Some(&self.words[start..end])
    }
}

/// Every dictionary embedded in the binary, sorted by id.
pub fn bundled_dictionaries() -> Vec<Dictionary> {
    DICTIONARY_DIR
        .files()
        .filter_map(|f| f.contents_utf8())
        .filter_map(|s| serde_json::from_str::<Dictionary>(s).ok())
        .sorted_by(|a, b| a.id.cmp(&b.id))
        .collect()
}

/// Offline provider backed by the embedded dictionaries. Results and
/// chapter stats are kept in memory.
#[derive(Debug, Default)]
pub struct BundledProvider {
    chapter_stats: ChapterPracticeStats,
    submitted: Vec<PracticeResult>,
}

impl BundledProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> &[PracticeResult] {
        &self.submitted
    }
}

impl PracticeDataProvider for BundledProvider {
    fn fetch_words(&mut self, dictionary: &str, chapter: u32) -> Result<Vec<Word>> {
        let dict = Dictionary::load(dictionary)?;
        dict.chapter(chapter)
            .map(<[Word]>::to_vec)
            .ok_or_else(|| PracticeError::UnknownChapter {
                dictionary: dictionary.to_string(),
                chapter,
            })
    }

    fn submit_practice_result(&mut self, result: &PracticeResult) -> Result<()> {
        debug!(word_id = %result.word_id, correct = result.is_correct, "practice result stored");
        self.submitted.push(result.clone());
        Ok(())
    }

    fn get_chapter_stats(&mut self) -> Result<ChapterPracticeStats> {
        Ok(self.chapter_stats.clone())
    }

    fn update_chapter_stats(&mut self, stats: &ChapterPracticeStats) -> Result<()> {
        self.chapter_stats = stats.clone();
        Ok(())
    }

    /// One point per day for the last `days` days (today included), oldest first.
    fn get_daily_progress(
        &mut self,
        days: u32,
        today: NaiveDate,
    ) -> Result<Vec<DailyProgressPoint>> {
        let points = (0..days as i64)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                let (words_practiced, correct_words) = self
                    .submitted
                    .iter()
                    .filter(|r| r.submitted_at.date_naive() == date)
                    .fold((0u32, 0u32), |(n, ok), r| (n + 1, ok + r.is_correct as u32));
                DailyProgressPoint {
                    date,
                    words_practiced,
                    correct_words,
                }
            })
            .collect();
        Ok(points)
    }
}
