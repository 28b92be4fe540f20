//! Latency formatting helpers.

/// Format a millisecond value for display.
pub fn format_millis(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.2}ms", ms)
    } else if ms < 1_000.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{:.2}s", ms / 1_000.0)
    }
}
