use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::TypingSession;
use crate::timer::Timestamp;

/// Unified event type consumed by the practice loop
#[derive(Clone, Debug)]
pub enum PracticeEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait PracticeEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<PracticeEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<PracticeEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(PracticeEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(PracticeEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PracticeEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PracticeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for headless tests
pub struct TestEventSource {
    rx: Receiver<PracticeEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<PracticeEvent>) -> Self {
        Self { rx }
    }
}

impl PracticeEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PracticeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: PracticeEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: PracticeEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> PracticeEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                PracticeEvent::Tick
            }
        }
    }
}

/// What a key press asks the session to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Type(char),
    Skip,
    TogglePause,
    Reset,
    Quit,
    Ignore,
}

impl From<KeyEvent> for KeyAction {
    fn from(key: KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return KeyAction::Ignore;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('c') if ctrl => KeyAction::Quit,
            KeyCode::Char('p') if ctrl => KeyAction::TogglePause,
            KeyCode::Char('r') if ctrl => KeyAction::Reset,
            KeyCode::Char(_) if ctrl => KeyAction::Ignore,
            KeyCode::Char(c) => KeyAction::Type(c),
            KeyCode::Tab => KeyAction::Skip,
            _ => KeyAction::Ignore,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Feed one event into the session.
pub fn dispatch(session: &mut TypingSession, event: &PracticeEvent, now: Timestamp) -> Control {
    match event {
        PracticeEvent::Key(key) => match KeyAction::from(*key) {
            KeyAction::Type(c) => session.handle_key(c, now),
            KeyAction::Skip => session.skip_word(now),
            KeyAction::TogglePause => session.toggle_pause(now),
            KeyAction::Reset => session.reset_practice(now),
            KeyAction::Quit => return Control::Quit,
            KeyAction::Ignore => {}
        },
        PracticeEvent::Tick => session.tick(now),
        PracticeEvent::Resize => {}
    }
    Control::Continue
}
