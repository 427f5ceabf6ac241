use chrono::{DateTime, Utc};

pub type Timestamp = DateTime<Utc>;

/// Wall-clock practice timer.
///
/// Elapsed time is always recomputed from `session_start_time`, never
/// accumulated per tick, so a host that stops ticking for a while (a
/// suspended terminal, a sleeping laptop) catches up on the next tick.
/// Pausing shifts the start forward on resume so the paused window never
/// counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTimer {
    session_start_time: Option<Timestamp>,
    paused_at: Option<Timestamp>,
    elapsed_secs: u64,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Timestamp) {
        self.session_start_time = Some(now);
        self.paused_at = None;
        self.elapsed_secs = 0;
    }

    /// Recompute elapsed time. A no-op while paused or stopped.
    pub fn tick(&mut self, now: Timestamp) -> u64 {
        if let (Some(start), None) = (self.session_start_time, self.paused_at) {
            self.elapsed_secs = secs_between(start, now);
        }
        self.elapsed_secs
    }

    pub fn pause(&mut self, now: Timestamp) {
        if self.is_running() {
            self.tick(now);
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: Timestamp) {
        if let (Some(start), Some(paused_at)) = (self.session_start_time, self.paused_at.take()) {
            let paused_for = (now - paused_at).max(chrono::Duration::zero());
            self.session_start_time = Some(start + paused_for);
            self.tick(now);
        }
    }

    /// Safe to call any number of times.
    pub fn stop(&mut self) {
        self.session_start_time = None;
        self.paused_at = None;
    }

    /// Rehydrate from a previously saved start instant. Elapsed time is
    /// applied immediately rather than on the next tick. If the timer is
    /// paused, elapsed time is frozen at the pause instant.
    pub fn set_session_start_time(&mut self, start: Timestamp, now: Timestamp) {
        self.session_start_time = Some(start);
        self.elapsed_secs = match self.paused_at {
            Some(paused_at) => secs_between(start, paused_at),
            None => secs_between(start, now),
        };
    }

    pub fn paused_at(&self) -> Option<Timestamp> {
        self.paused_at
    }

    pub fn session_start_time(&self) -> Option<Timestamp> {
        self.session_start_time
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn is_running(&self) -> bool {
        self.session_start_time.is_some() && self.paused_at.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn formatted(&self) -> String {
        format_mm_ss(self.elapsed_secs)
    }
}

fn secs_between(start: Timestamp, end: Timestamp) -> u64 {
    (end - start).num_seconds().max(0) as u64
}

pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
