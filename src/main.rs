use chrono::{Duration as ChronoDuration, Utc};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spellkey::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    mistake_db::{KeyMistake, MistakeDb},
    progress::format_practice_count,
    provider::{bundled_dictionaries, BundledProvider, Dictionary, PracticeDataProvider},
    runtime::{dispatch, Control, CrosstermEventSource, FixedTicker, Runner},
    session::{SessionEvent, TypingSession},
    store::{FilePracticeStore, PracticeData, PracticeStore},
    timer::format_mm_ss,
    ui::{
        heatmap::{format_heat_line, history_rows, session_rows, with_confusions, HeatRow},
        PracticeView,
    },
};

const TICK_RATE_MS: u64 = 100;
const HEAT_MAP_ROWS: usize = 10;

/// vocabulary typing practice in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type your way through vocabulary chapters. Mistyped words land in a notebook, every wrong key feeds a heat map, and chapter practice counts and daily practice time are kept between runs."
)]
pub struct Cli {
    /// dictionary to practice (see `spellkey dictionaries`)
    #[clap(short = 'd', long)]
    dictionary: Option<String>,

    /// chapter to practice, starting at 1
    #[clap(short = 'c', long)]
    chapter: Option<u32>,

    /// shuffle the chapter's words
    #[clap(long)]
    shuffle: bool,

    /// directory for practice data, mistake history and config
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// practice a chapter (the default)
    Practice,
    /// list bundled dictionaries and how often each chapter was practiced
    Dictionaries,
    /// show the wrong-word notebook
    Notebook {
        /// remove one word from the notebook
        #[clap(long, conflicts_with = "clear")]
        remove: Option<String>,
        /// remove every word from the notebook
        #[clap(long)]
        clear: bool,
    },
    /// practice time and chapter totals
    Stats {
        /// number of days of practice time to list
        #[clap(long, default_value_t = 7)]
        days: u32,
    },
    /// keys missed most across every session
    Heatmap {
        #[clap(long, default_value_t = HEAT_MAP_ROWS)]
        limit: usize,
        /// forget the recorded mistake history
        #[clap(long)]
        clear: bool,
    },
    /// reset the accumulated daily practice time
    ResetDaily,
}

/// Where everything is read from and written to.
struct Paths {
    data: PathBuf,
    db: PathBuf,
    config: PathBuf,
    log: PathBuf,
}

impl Paths {
    fn resolve(data_dir: Option<&Path>) -> Self {
        match data_dir {
            Some(dir) => Self {
                data: dir.join("practice.json"),
                db: dir.join("mistakes.db"),
                config: dir.join("config.json"),
                log: dir.join("spellkey.log"),
            },
            None => Self {
                data: AppDirs::data_path(),
                db: AppDirs::db_path(),
                config: AppDirs::config_path(),
                log: AppDirs::state_dir().join("spellkey.log"),
            },
        }
    }
}

/// Log to stderr for one-shot commands. The practice screen owns the
/// terminal, so it logs to a file instead.
fn init_logging(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter);

    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let result = match file {
        Some(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => builder.with_writer(io::stderr).try_init(),
    };
    if let Err(err) = result {
        eprintln!("logging bootstrap failed: {err}");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let paths = Paths::resolve(cli.data_dir.as_deref());

    let command = cli.command.clone().unwrap_or(Command::Practice);
    init_logging(matches!(command, Command::Practice).then_some(paths.log.as_path()));

    let store = FilePracticeStore::with_path(&paths.data);
    match command {
        Command::Practice => run_practice(&cli, &paths, &store),
        Command::Dictionaries => list_dictionaries(&store),
        Command::Notebook { remove, clear } => notebook(&store, remove, clear),
        Command::Stats { days } => show_stats(&store, &paths.db, days),
        Command::Heatmap { limit, clear } => show_heat_map(&paths.db, limit, clear),
        Command::ResetDaily => reset_daily(&store),
    }
}

fn run_practice(
    cli: &Cli,
    paths: &Paths,
    store: &FilePracticeStore,
) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::with_path(&paths.config);
    let mut config = config_store.load();
    if let Some(dictionary) = &cli.dictionary {
        config.dictionary = dictionary.clone();
    }
    if let Some(chapter) = cli.chapter {
        config.chapter = chapter;
    }
    // fail fast on a typo instead of burning retries
    Dictionary::load(&config.dictionary)?;

    let data = store.load()?;

    let mut provider = BundledProvider::new();
    provider.update_chapter_stats(&data.chapter_practice_stats)?;

    let mut session = TypingSession::load(
        &mut provider,
        &config.dictionary,
        config.chapter,
        data,
        config.max_load_retries,
    )?;
    if cli.shuffle || config.shuffle {
        session.shuffle_words(&mut rand::thread_rng());
    }

    let mut db = match MistakeDb::open(&paths.db) {
        Ok(db) => Some(db),
        Err(e) => {
            warn!(error = %e, path = %paths.db.display(), "mistake history unavailable");
            None
        }
    };

    info!(dictionary = %config.dictionary, chapter = config.chapter, "starting practice");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = practice_loop(&mut terminal, &mut session, &mut provider, db.as_mut(), store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    session.flush_telemetry(&mut provider);
    store.save(session.data())?;
    if let Err(e) = config_store.save(&config) {
        warn!(error = %e, "could not save config");
    }

    result
}

fn practice_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    session: &mut TypingSession,
    provider: &mut dyn PracticeDataProvider,
    mut db: Option<&mut MistakeDb>,
    store: &dyn PracticeStore,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut notice: Option<String> = None;
    let mut heat_rows: Vec<HeatRow> = Vec::new();
    let mut unsaved_mistakes: Vec<KeyMistake> = Vec::new();

    session.start(Utc::now());

    loop {
        for event in session.drain_events() {
            match event {
                SessionEvent::WrongKey {
                    expected, typed, ..
                } => unsaved_mistakes.push(KeyMistake {
                    expected,
                    typed,
                    dictionary: session.dictionary().to_string(),
                    timestamp: Utc::now(),
                }),
                SessionEvent::ChapterCompleted(_) => {
                    save_mistakes(db.as_deref_mut(), &mut unsaved_mistakes);
                    session.flush_telemetry(provider);
                    if let Err(e) = store.save(session.data()) {
                        warn!(error = %e, "could not save practice data");
                        notice = Some(format!("could not save practice data: {e}"));
                    }
                    let history = db
                        .as_deref()
                        .map(|db| history_rows(db, usize::MAX))
                        .transpose()
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "could not read mistake history");
                            None
                        })
                        .unwrap_or_default();
                    heat_rows = with_confusions(session_rows(&session.heat_map()), &history);
                    heat_rows.truncate(HEAT_MAP_ROWS);
                }
                SessionEvent::Warning(message) => notice = Some(message),
                _ => {}
            }
        }

        let view = PracticeView {
            session,
            notice: notice.as_deref(),
            heat_rows: &heat_rows,
        };
        terminal.draw(|f| f.render_widget(&view, f.area()))?;

        let event = runner.step();
        if dispatch(session, &event, Utc::now()) == Control::Quit {
            break;
        }
    }

    save_mistakes(db, &mut unsaved_mistakes);
    Ok(())
}

fn save_mistakes(db: Option<&mut MistakeDb>, mistakes: &mut Vec<KeyMistake>) {
    let Some(db) = db else {
        mistakes.clear();
        return;
    };
    if mistakes.is_empty() {
        return;
    }
    match db.record_mistakes_batch(mistakes) {
        Ok(()) => mistakes.clear(),
        Err(e) => warn!(error = %e, pending = mistakes.len(), "could not save mistakes"),
    }
}

fn list_dictionaries(store: &dyn PracticeStore) -> Result<(), Box<dyn Error>> {
    let data = store.load()?;
    for dict in bundled_dictionaries() {
        println!(
            "{:<8} {} ({} words, {} chapters)",
            dict.id,
            dict.name,
            dict.words.len(),
            dict.chapter_count()
        );
        for chapter in 1..=dict.chapter_count() {
            println!(
                "    chapter {chapter:>2}  practiced {}",
                data.chapter_practice_stats
                    .get_chapter_practice_count_display(&dict.id, chapter)
            );
        }
    }
    Ok(())
}

fn notebook(
    store: &dyn PracticeStore,
    remove: Option<String>,
    clear: bool,
) -> Result<(), Box<dyn Error>> {
    let mut data = store.load()?;
    let notebook = &mut data.wrong_words_notebook;

    if let Some(word) = remove {
        if notebook.remove_wrong_word(&word) {
            store.save(&data)?;
            println!("removed {word}");
        } else {
            println!("{word} is not in the notebook");
        }
        return Ok(());
    }

    if clear {
        notebook.clear_wrong_words_notebook();
        store.save(&data)?;
        println!("notebook cleared");
        return Ok(());
    }

    if notebook.is_empty() {
        println!("notebook is empty");
        return Ok(());
    }

    for entry in notebook.most_missed(notebook.len()) {
        println!(
            "{:<16} {:<24} {} ch.{:<3} {:>3}x  {}",
            entry.word,
            entry.translation,
            entry.dictionary,
            entry.chapter,
            entry.error_count,
            entry.last_error_time.format("%Y-%m-%d %H:%M")
        );
    }
    let stats = notebook.get_wrong_words_notebook_stats();
    println!(
        "{} words, {} errors across {} dictionaries",
        stats.total_words, stats.total_errors, stats.dictionary_count
    );
    Ok(())
}

fn show_stats(
    store: &dyn PracticeStore,
    db_path: &Path,
    days: u32,
) -> Result<(), Box<dyn Error>> {
    let data: PracticeData = store.load()?;
    let daily = &data.daily_practice_duration;

    println!(
        "practice time {} over {} sessions",
        format_mm_ss(daily.total_seconds),
        daily.sessions.len()
    );

    let today = Utc::now().date_naive();
    for offset in (0..days as i64).rev() {
        let date = today - ChronoDuration::days(offset);
        println!("  {date}  {}", format_mm_ss(daily.seconds_on(date)));
    }

    let since = Utc::now() - ChronoDuration::days(days as i64);
    let recent = MistakeDb::open(db_path)?.mistakes_since(since)?;
    println!("{} wrong keys in the last {days} days", recent.len());

    for (dictionary, chapters) in data.chapter_practice_stats.dictionaries() {
        let total: u32 = chapters.values().sum();
        println!(
            "{dictionary}: {} chapters practiced, {} runs",
            chapters.len(),
            format_practice_count(total)
        );
    }
    Ok(())
}

fn show_heat_map(db_path: &Path, limit: usize, clear: bool) -> Result<(), Box<dyn Error>> {
    let db = MistakeDb::open(db_path)?;
    if clear {
        db.clear_all()?;
        println!("mistake history cleared");
        return Ok(());
    }
    let rows = history_rows(&db, limit)?;
    if rows.is_empty() {
        println!("no mistakes recorded yet");
    }
    for row in &rows {
        println!("{}", format_heat_line(row));
    }
    Ok(())
}

fn reset_daily(store: &dyn PracticeStore) -> Result<(), Box<dyn Error>> {
    let mut data = store.load()?;
    data.daily_practice_duration.reset_daily_practice_duration();
    store.save(&data)?;
    println!("daily practice time reset");
    Ok(())
}
