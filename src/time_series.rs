use serde::{Deserialize, Serialize};

/// One WPM sample: `t` seconds into the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

/// Highest sample, used to scale a chart's y axis.
pub fn peak_wpm(points: &[TimeSeriesPoint]) -> f64 {
    points.iter().map(|p| p.wpm).fold(0.0, f64::max)
}
