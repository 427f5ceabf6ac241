use crate::time_series::{peak_wpm, TimeSeriesPoint};

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(points: &[TimeSeriesPoint], practice_secs: u64) -> (f64, f64) {
    let overall_duration = points
        .last()
        .map_or(practice_secs as f64, |p| p.t.max(practice_secs as f64))
        .max(1.0);

    (overall_duration, peak_wpm(points).round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
