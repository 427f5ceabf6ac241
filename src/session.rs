use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;

use crate::completion::{generate_chapter_completion, ChapterCompletion, ChapterCompletionData};
use crate::error::{PracticeError, Result};
use crate::mistakes::{MistakeMap, MistakeRecorder};
use crate::provider::{load_words_with_retry, PracticeDataProvider, PracticeResult};
use crate::stats::{self, LetterStats, SessionCounters};
use crate::store::PracticeData;
use crate::time_series::TimeSeriesPoint;
use crate::timer::{SessionTimer, Timestamp};
use crate::word::Word;
use crate::word_state::WordState;

/// Pause between finishing a word and showing the next one.
pub const WORD_ADVANCE_DELAY_MS: i64 = 500;
/// How long a wrong letter stays highlighted before the word restarts.
pub const WRONG_CLEAR_DELAY_MS: i64 = 1000;

/// Notifications for the host (sound, redraw, persistence). The engine
/// only queues them; see [`TypingSession::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CorrectKey {
        expected: char,
        position: usize,
    },
    WrongKey {
        expected: char,
        typed: char,
        position: usize,
    },
    WordCompleted {
        index: usize,
        word: String,
        had_mistakes: bool,
    },
    WordSkipped {
        index: usize,
        word: String,
    },
    WordChanged {
        index: usize,
        word: Word,
    },
    ChapterCompleted(ChapterCompletionData),
    Warning(String),
}

/// One practice run over one chapter of one dictionary.
#[derive(Debug)]
pub struct TypingSession {
    pub(crate) dictionary: String,
    pub(crate) chapter: u32,
    pub(crate) words: Vec<Word>,
    pub(crate) current_index: usize,
    pub(crate) word_state: WordState,
    pub(crate) mistakes: MistakeRecorder,
    pub(crate) letter_stats: LetterStats,
    pub(crate) counters: SessionCounters,
    pub(crate) timer: SessionTimer,
    pub(crate) data: PracticeData,
    pub(crate) completion: ChapterCompletion,
    pub(crate) touched_words: Vec<String>,
    pub(crate) wrong_clear_due: Option<Timestamp>,
    pub(crate) advance_due: Option<Timestamp>,
    pub(crate) started: bool,
    pub(crate) events: VecDeque<SessionEvent>,
    pub(crate) pending_results: Vec<PracticeResult>,
    pub(crate) stats_dirty: bool,
    pub(crate) wpm_history: Vec<TimeSeriesPoint>,
}

impl TypingSession {
    pub fn new(
        dictionary: impl Into<String>,
        chapter: u32,
        words: Vec<Word>,
        data: PracticeData,
    ) -> Result<Self> {
        let dictionary = dictionary.into();
        let words: Vec<Word> = words.into_iter().filter(Word::is_typeable).collect();
        if words.is_empty() {
            return Err(PracticeError::EmptyWordList {
                dictionary,
                chapter,
            });
        }

        Ok(Self {
            dictionary,
            chapter,
            words,
            current_index: 0,
            word_state: WordState::default(),
            mistakes: MistakeRecorder::new(),
            letter_stats: LetterStats::default(),
            counters: SessionCounters::default(),
            timer: SessionTimer::new(),
            data,
            completion: ChapterCompletion::default(),
            touched_words: Vec::new(),
            wrong_clear_due: None,
            advance_due: None,
            started: false,
            events: VecDeque::new(),
            pending_results: Vec::new(),
            stats_dirty: false,
            wpm_history: Vec::new(),
        })
    }

    /// Fetch the chapter through `provider` with bounded retries. Each failed
    /// attempt is queued as a [`SessionEvent::Warning`].
    pub fn load(
        provider: &mut dyn PracticeDataProvider,
        dictionary: &str,
        chapter: u32,
        data: PracticeData,
        max_attempts: u32,
    ) -> Result<Self> {
        let mut warnings = Vec::new();
        let words = load_words_with_retry(provider, dictionary, chapter, max_attempts, |e, n| {
            warnings.push(retry_warning(e, n, max_attempts))
        })?;

        let mut session = Self::new(dictionary, chapter, words, data)?;
        for message in warnings {
            session.warn_user(message);
        }
        Ok(session)
    }

    /// Move to another dictionary/chapter: reload that dictionary's practice
    /// counts, fetch its words and start a fresh run. A failed count reload
    /// only produces a warning. A failed word load leaves the current run
    /// untouched.
    pub fn switch_dictionary(
        &mut self,
        provider: &mut dyn PracticeDataProvider,
        dictionary: &str,
        chapter: u32,
        max_attempts: u32,
        now: Timestamp,
    ) -> Result<()> {
        if let Err(e) = self
            .data
            .chapter_practice_stats
            .reload_dictionary(dictionary, provider)
        {
            self.warn_user(format!(
                "could not refresh practice counts for {dictionary}: {e}"
            ));
        }

        let mut warnings = Vec::new();
        let words = load_words_with_retry(provider, dictionary, chapter, max_attempts, |e, n| {
            warnings.push(retry_warning(e, n, max_attempts))
        });
        for message in warnings {
            self.warn_user(message);
        }
        let words = words?;

        self.dictionary = dictionary.to_string();
        self.chapter = chapter;
        self.words = words;
        self.mistakes.reset_cumulative();
        self.touched_words.clear();
        self.reset_practice(now);
        Ok(())
    }

    /// Randomise word order. Only allowed before the run starts.
    pub fn shuffle_words<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.started {
            self.words.shuffle(rng);
        }
    }

    pub fn start(&mut self, now: Timestamp) {
        if self.started {
            return;
        }
        self.started = true;
        self.timer.start(now);
        self.begin_word(now);
    }

    /// Fire due one-shot transitions and refresh the clock. Nothing happens
    /// while paused.
    pub fn tick(&mut self, now: Timestamp) {
        if self.timer.is_paused() {
            return;
        }
        if self.wrong_clear_due.is_some_and(|due| now >= due) {
            self.clear_pending_wrong();
        }
        if self.advance_due.is_some_and(|due| now >= due) {
            self.advance(now);
        }
        self.timer.tick(now);
        self.refresh_wpm();
    }

    pub fn pause(&mut self, now: Timestamp) {
        if self.started && !self.completion.is_completed() {
            self.timer.pause(now);
        }
    }

    /// Pending deadlines move forward by the paused span.
    pub fn resume(&mut self, now: Timestamp) {
        if let Some(paused_at) = self.timer.paused_at() {
            let paused_for = (now - paused_at).max(Duration::zero());
            self.wrong_clear_due = self.wrong_clear_due.map(|due| due + paused_for);
            self.advance_due = self.advance_due.map(|due| due + paused_for);
        }
        self.timer.resume(now);
        self.refresh_wpm();
    }

    pub fn toggle_pause(&mut self, now: Timestamp) {
        if self.timer.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }
    }

    /// Start the chapter over. Word counters, letter totals and the session
    /// mistake map are cleared; the cumulative mistake map is kept for the
    /// chapter heat map.
    pub fn reset_practice(&mut self, now: Timestamp) {
        self.counters.reset();
        self.letter_stats.reset();
        self.mistakes.reset_session();
        self.completion.reset_chapter_completion();
        self.wpm_history.clear();
        self.current_index = 0;
        self.wrong_clear_due = None;
        self.advance_due = None;
        self.started = false;
        self.start(now);
    }

    /// Restore the clock from a saved start instant.
    pub fn set_session_start_time(&mut self, start: Timestamp, now: Timestamp) {
        self.timer.set_session_start_time(start, now);
        self.refresh_wpm();
    }

    /// Push queued results and changed chapter stats to `provider`.
    /// Failures are logged and dropped; local state is never rolled back.
    pub fn flush_telemetry(&mut self, provider: &mut dyn PracticeDataProvider) {
        for result in self.pending_results.drain(..) {
            if let Err(e) = provider.submit_practice_result(&result) {
                debug!(word_id = %result.word_id, error = %e, "dropping practice result");
            }
        }
        if std::mem::take(&mut self.stats_dirty) {
            if let Err(e) = provider.update_chapter_stats(&self.data.chapter_practice_stats) {
                debug!(error = %e, "chapter stats sync failed");
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub(crate) fn begin_word(&mut self, now: Timestamp) {
        let word = self.words[self.current_index].clone();
        self.word_state.init_word(&word.word, now);
        self.mistakes.begin_word();
        self.letter_stats.begin_word();
        self.events.push_back(SessionEvent::WordChanged {
            index: self.current_index,
            word,
        });
    }

    pub(crate) fn clear_pending_wrong(&mut self) {
        if self.word_state.has_wrong() {
            self.word_state.clear_wrong();
        }
        self.wrong_clear_due = None;
    }

    pub(crate) fn advance(&mut self, now: Timestamp) {
        self.advance_due = None;
        self.wrong_clear_due = None;
        if self.current_index + 1 < self.words.len() {
            self.current_index += 1;
            self.begin_word(now);
        } else {
            self.complete_chapter(now);
        }
    }

    fn complete_chapter(&mut self, now: Timestamp) {
        let secs = self.timer.tick(now);
        let data = generate_chapter_completion(
            &self.letter_stats,
            secs,
            &self.data.wrong_words_notebook,
            &self.touched_words,
            &self.dictionary,
            self.chapter,
        );

        let count = self
            .data
            .chapter_practice_stats
            .increment_chapter_practice_count(&self.dictionary, self.chapter);
        self.data
            .daily_practice_duration
            .record_practice_session(secs, now);
        self.timer.stop();
        self.stats_dirty = true;
        self.completion.mark_chapter_completed(data.clone());

        debug!(
            dictionary = %self.dictionary,
            chapter = self.chapter,
            practice_count = count,
            accuracy = data.accuracy,
            wpm = data.wpm,
            "chapter completed"
        );
        self.events.push_back(SessionEvent::ChapterCompleted(data));
    }

    pub(crate) fn refresh_wpm(&mut self) {
        self.counters.current_wpm = stats::average_wpm(
            self.letter_stats.total_correct_letters,
            self.timer.elapsed_secs(),
        );
    }

    /// Queue a message for the host to show. Logging happens where the
    /// failure is detected.
    pub(crate) fn warn_user(&mut self, message: String) {
        self.events.push_back(SessionEvent::Warning(message));
    }

    pub fn dictionary(&self) -> &str {
        &self.dictionary
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_word(&self) -> Option<&Word> {
        self.words.get(self.current_index)
    }

    pub fn word_state(&self) -> &WordState {
        &self.word_state
    }

    pub fn progress_percentage(&self) -> u32 {
        if self.words.is_empty() {
            return 0;
        }
        ((self.current_index + 1) as f64 / self.words.len() as f64 * 100.0).round() as u32
    }

    pub fn correct_rate(&self) -> u32 {
        self.counters.correct_rate()
    }

    pub fn letter_accuracy(&self) -> u32 {
        stats::letter_accuracy(&self.letter_stats)
    }

    pub fn average_wpm(&self) -> u32 {
        self.counters.current_wpm
    }

    pub fn session_time(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn session_time_display(&self) -> String {
        self.timer.formatted()
    }

    pub fn session_start_time(&self) -> Option<Timestamp> {
        self.timer.session_start_time()
    }

    pub fn key_mistakes(&self) -> &MistakeMap {
        self.mistakes.key_mistakes()
    }

    pub fn cumulative_key_mistakes(&self) -> &MistakeMap {
        self.mistakes.cumulative_key_mistakes()
    }

    /// Latest `(expected, typed)` pair in the word being typed.
    pub fn last_confusion(&self) -> Option<(char, char)> {
        self.mistakes.word_confusions().last().copied()
    }

    pub fn heat_map(&self) -> Vec<(char, usize)> {
        self.mistakes.heat_map()
    }

    pub fn letter_stats(&self) -> &LetterStats {
        &self.letter_stats
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.counters
    }

    pub fn completion(&self) -> &ChapterCompletion {
        &self.completion
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_paused(&self) -> bool {
        self.timer.is_paused()
    }

    pub fn is_chapter_completed(&self) -> bool {
        self.completion.is_completed()
    }

    pub fn wpm_history(&self) -> &[TimeSeriesPoint] {
        &self.wpm_history
    }

    pub fn pending_results(&self) -> &[PracticeResult] {
        &self.pending_results
    }

    pub fn data(&self) -> &PracticeData {
        &self.data
    }

    pub fn into_data(self) -> PracticeData {
        self.data
    }
}

fn retry_warning(error: &PracticeError, attempt: u32, max_attempts: u32) -> String {
    format!("loading words failed (attempt {attempt}/{max_attempts}): {error}")
}

/// Advance by a fixed delay, in milliseconds.
pub(crate) fn after(now: Timestamp, delay_ms: i64) -> Timestamp {
    now + Duration::milliseconds(delay_ms)
}
