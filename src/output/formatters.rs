use serde::Serialize;

use crate::cli::OutputFormat;
use crate::transcript::CaptionEntry;
use crate::utils::{bracket_timestamp, clock_timestamp, subtitle_timestamp};
use crate::Result;

/// Render caption entries in the requested format.
///
/// `include_timestamps` only affects [`OutputFormat::Text`].
pub fn format_transcript(
    entries: &[CaptionEntry],
    format: OutputFormat,
    include_timestamps: bool,
) -> Result<String> {
    let content = match format {
        OutputFormat::Text => format_as_text(entries, include_timestamps),
        OutputFormat::Json => format_as_json(entries)?,
        OutputFormat::Srt => format_as_srt(entries),
        OutputFormat::Vtt => format_as_vtt(entries),
    };
    Ok(content)
}

/// Entry texts joined with `\n`, optionally prefixed with `[HH:MM:SS]`
pub fn format_as_text(entries: &[CaptionEntry], include_timestamps: bool) -> String {
    entries
        .iter()
        .map(|entry| {
            if include_timestamps {
                format!("{} {}", bracket_timestamp(entry.start), entry.text)
            } else {
                entry.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    text: &'a str,
    start: String,
    duration: f64,
}

/// Pretty-printed JSON array with `HH:MM:SS` start and raw duration
pub fn format_as_json(entries: &[CaptionEntry]) -> Result<String> {
    let json_entries: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|entry| JsonEntry {
            text: &entry.text,
            start: clock_timestamp(entry.start),
            duration: entry.duration,
        })
        .collect();

    Ok(serde_json::to_string_pretty(&json_entries)?)
}

pub fn format_as_srt(entries: &[CaptionEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len() * 4);

    for (i, entry) in entries.iter().enumerate() {
        lines.push((i + 1).to_string());
        lines.push(cue_timing(entry, ','));
        lines.push(entry.text.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

pub fn format_as_vtt(entries: &[CaptionEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len() * 3 + 1);
    lines.push("WEBVTT\n".to_string());

    for entry in entries {
        lines.push(cue_timing(entry, '.'));
        lines.push(entry.text.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

fn cue_timing(entry: &CaptionEntry, separator: char) -> String {
    format!(
        "{} --> {}",
        subtitle_timestamp(entry.start, separator),
        subtitle_timestamp(entry.end(), separator)
    )
}
