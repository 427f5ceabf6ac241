use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::daily::DailyPracticeDuration;
use crate::error::Result;
use crate::notebook::WrongWordsNotebook;
use crate::progress::ChapterPracticeStats;

/// Everything that outlives a practice run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PracticeData {
    pub chapter_practice_stats: ChapterPracticeStats,
    pub wrong_words_notebook: WrongWordsNotebook,
    pub daily_practice_duration: DailyPracticeDuration,
}

pub trait PracticeStore {
    fn load(&self) -> Result<PracticeData>;
    fn save(&self, data: &PracticeData) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FilePracticeStore {
    path: PathBuf,
}

impl FilePracticeStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::data_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PracticeStore for FilePracticeStore {
    /// A missing file is an empty history; a corrupt one is an error so it
    /// never gets silently overwritten.
    fn load(&self) -> Result<PracticeData> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(PracticeData::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, data: &PracticeData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}
