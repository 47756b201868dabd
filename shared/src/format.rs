//! Display formatting for volumes, durations and countdowns

/// Format a training volume in kg.
///
/// Volumes of a tonne or more are shown in tonnes with one decimal
/// (`1500.0` -> `"1.5t"`), smaller volumes as whole or fractional kg.
pub fn format_volume(volume_kg: f64) -> String {
    if volume_kg >= 1000.0 {
        format!("{:.1}t", volume_kg / 1000.0)
    } else if volume_kg.fract() == 0.0 {
        format!("{} kg", volume_kg as i64)
    } else {
        format!("{} kg", volume_kg)
    }
}

/// Format seconds as `m:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Format a workout duration in minutes (`45 min`, `1h 05min`)
pub fn format_minutes(minutes: u32) -> String {
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{}h {:02}min", minutes / 60, minutes % 60)
    }
}

/// Format a metric delta with an explicit sign (`+1.5`, `-0.4`, `0.0`)
pub fn format_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{:.1}", delta)
    } else {
        format!("{:.1}", delta)
    }
}
