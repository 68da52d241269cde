use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;

/// Whole-second `HH:MM:SS` clock for a start offset, truncating any fraction
pub fn clock_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// `[HH:MM:SS]` prefix used by the timestamped text format
pub fn bracket_timestamp(seconds: f64) -> String {
    format!("[{}]", clock_timestamp(seconds))
}

/// Subtitle cue timestamp `HH:MM:SS<sep>mmm`.
///
/// SRT uses `,` and WebVTT uses `.` as the millisecond separator. The value is
/// rounded to the nearest millisecond before it is split into fields.
pub fn subtitle_timestamp(seconds: f64, separator: char) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1_000;
    let millis = total_millis % 1_000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, secs, separator, millis
    )
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Append the format's extension when the file name has no `.` in it.
/// Paths without a file name (`.`, `..`) are returned unchanged.
pub fn with_default_extension(path: &Path, format: OutputFormat) -> PathBuf {
    let has_dot = match path.file_name() {
        Some(name) => name.to_string_lossy().contains('.'),
        None => true,
    };

    if has_dot {
        return path.to_path_buf();
    }

    let mut with_ext = path.as_os_str().to_os_string();
    with_ext.push(format.extension());
    PathBuf::from(with_ext)
}
