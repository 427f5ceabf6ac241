use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::Result;
use crate::provider::PracticeDataProvider;

/// Counts above this are displayed as `999+`.
pub const PRACTICE_COUNT_DISPLAY_CAP: u32 = 999;

/// How many times each chapter of each dictionary has been completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterPracticeStats(BTreeMap<String, BTreeMap<u32, u32>>);

impl ChapterPracticeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_chapter_practice_count(&mut self, dictionary: &str, chapter: u32) -> u32 {
        let count = self
            .0
            .entry(dictionary.to_string())
            .or_default()
            .entry(chapter)
            .or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn get_chapter_practice_count(&self, dictionary: &str, chapter: u32) -> u32 {
        self.0
            .get(dictionary)
            .and_then(|chapters| chapters.get(&chapter))
            .copied()
            .unwrap_or(0)
    }

    pub fn reset_chapter_practice_count(&mut self, dictionary: &str, chapter: u32) {
        if let Some(chapters) = self.0.get_mut(dictionary) {
            chapters.remove(&chapter);
            if chapters.is_empty() {
                self.0.remove(dictionary);
            }
        }
    }

    pub fn get_chapter_practice_count_display(&self, dictionary: &str, chapter: u32) -> String {
        format_practice_count(self.get_chapter_practice_count(dictionary, chapter))
    }

    pub fn set_chapter_practice_count(&mut self, dictionary: &str, chapter: u32, count: u32) {
        self.0
            .entry(dictionary.to_string())
            .or_default()
            .insert(chapter, count);
    }

    pub fn dictionary(&self, dictionary: &str) -> Option<&BTreeMap<u32, u32>> {
        self.0.get(dictionary)
    }

    pub fn dictionaries(&self) -> impl Iterator<Item = (&String, &BTreeMap<u32, u32>)> {
        self.0.iter()
    }

    /// Merge the remote counts for one dictionary, keeping the larger count
    /// per chapter. Local chapters the remote has not seen yet are kept. On
    /// failure the local map is left exactly as it was and the error is
    /// returned for the caller to surface as a warning.
    pub fn reload_dictionary(
        &mut self,
        dictionary: &str,
        provider: &mut dyn PracticeDataProvider,
    ) -> Result<()> {
        let remote = provider.get_chapter_stats().inspect_err(|e| {
            warn!(dictionary, error = %e, "failed to reload chapter practice counts");
        })?;

        if let Some(chapters) = remote.0.get(dictionary) {
            let local = self.0.entry(dictionary.to_string()).or_default();
            for (&chapter, &count) in chapters {
                let entry = local.entry(chapter).or_insert(0);
                *entry = (*entry).max(count);
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn format_practice_count(count: u32) -> String {
    if count > PRACTICE_COUNT_DISPLAY_CAP {
        format!("{PRACTICE_COUNT_DISPLAY_CAP}+")
    } else {
        count.to_string()
    }
}
