//! Display values derived from a position/duration pair.

/// Progress bar ratio plus `m:ss` clock labels. Never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressProjection {
    /// Always within `[0, 1]`.
    pub ratio: f64,
    pub position_label: String,
    pub duration_label: String,
}

pub fn project(position_ms: u64, duration_ms: u64) -> ProgressProjection {
    let ratio = if duration_ms > 0 {
        (position_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    ProgressProjection {
        ratio,
        position_label: format_clock(position_ms),
        duration_label: format_clock(duration_ms),
    }
}

/// Format milliseconds as `m:ss`. Minutes are unbounded; there is no hour field.
pub fn format_clock(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}
