use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "spellkey";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/spellkey`, or the platform data dir without a HOME.
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(format!(".{APP_NAME}"))
        }
    }

    pub fn data_path() -> PathBuf {
        Self::state_dir().join("practice.json")
    }

    pub fn db_path() -> PathBuf {
        Self::state_dir().join("mistakes.db")
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from(format!(".{APP_NAME}")).join("config.json"))
    }
}
