use thiserror::Error;

/// Everything that can go wrong around a practice run.
///
/// Keystroke mismatches are never represented here: a wrong key is a
/// letter state, not a failure.
#[derive(Debug, Error)]
pub enum PracticeError {
    #[error("failed to load {dictionary} chapter {chapter} after {attempts} attempt(s): {message}")]
    DataLoad {
        dictionary: String,
        chapter: u32,
        attempts: u32,
        message: String,
    },

    #[error("{dictionary} chapter {chapter} has no words to practice")]
    EmptyWordList { dictionary: String, chapter: u32 },

    #[error("telemetry: {0}")]
    Telemetry(String),

    #[error("unknown dictionary '{0}'")]
    UnknownDictionary(String),

    #[error("dictionary '{dictionary}' has no chapter {chapter}")]
    UnknownChapter { dictionary: String, chapter: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, PracticeError>;
