// Library surface for the practice engine, shared by the binary and the
// headless integration tests.
pub mod app_dirs;
pub mod completion;
pub mod config;
pub mod daily;
pub mod error;
pub mod keystroke;
pub mod mistake_db;
pub mod mistakes;
pub mod notebook;
pub mod progress;
pub mod provider;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod time_series;
pub mod timer;
pub mod ui;
pub mod word;
pub mod word_state;

pub use error::{PracticeError, Result};
pub use session::{SessionEvent, TypingSession};
