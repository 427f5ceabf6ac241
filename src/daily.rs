use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::timer::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeSessionRecord {
    /// Seconds.
    pub duration: u64,
    pub timestamp: Timestamp,
}

/// Accumulated practice time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPracticeDuration {
    pub total_seconds: u64,
    pub sessions: Vec<PracticeSessionRecord>,
}

impl DailyPracticeDuration {
    pub fn record_practice_session(&mut self, duration: u64, now: Timestamp) {
        self.total_seconds = self.total_seconds.saturating_add(duration);
        self.sessions.push(PracticeSessionRecord {
            duration,
            timestamp: now,
        });
    }

    pub fn reset_daily_practice_duration(&mut self) {
        self.total_seconds = 0;
        self.sessions.clear();
    }

    /// Seconds practiced on a given UTC day.
    pub fn seconds_on(&self, date: NaiveDate) -> u64 {
        self.sessions
            .iter()
            .filter(|s| s.timestamp.date_naive() == date)
            .map(|s| s.duration)
            .sum()
    }
}

/// One day of progress as reported by a [`crate::provider::PracticeDataProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgressPoint {
    pub date: NaiveDate,
    pub words_practiced: u32,
    pub correct_words: u32,
}
