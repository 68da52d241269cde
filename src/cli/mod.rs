use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use crate::TranscriptError;

#[derive(Parser, Debug)]
#[command(
    name = "yt-transcript-dl",
    about = "Download YouTube video transcripts",
    version,
    long_about = "Fetch the transcript of a YouTube video and print it, save it to a file or copy it to the clipboard as plain text, JSON, SRT or WebVTT."
)]
pub struct Cli {
    /// YouTube video ID or URL
    #[arg(value_name = "VIDEO_ID_OR_URL")]
    pub video_id: String,

    /// Output file (optional, extension is added when missing)
    #[arg(value_name = "OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Output format [default: text]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Include timestamps in text format output
    #[arg(long)]
    pub add_timestamps: bool,

    /// Display transcript content even when saving to file or clipboard
    #[arg(short, long)]
    pub verbose: bool,

    /// Copy transcript to clipboard
    #[arg(short, long)]
    pub clipboard: bool,

    /// Path to a YAML configuration file
    #[arg(long, value_name = "FILE", env = "YT_TRANSCRIPT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text, optionally with [HH:MM:SS] timestamps
    #[default]
    Text,
    /// JSON array of caption entries
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl OutputFormat {
    /// Default file extension for the format, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => ".txt",
            OutputFormat::Json => ".json",
            OutputFormat::Srt => ".srt",
            OutputFormat::Vtt => ".vtt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" => Ok(OutputFormat::Vtt),
            _ => Err(TranscriptError::InvalidFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "yt-transcript-dl",
            "dQw4w9WgXcQ",
            "clip",
            "--format",
            "srt",
            "-v",
            "-c",
        ])
        .unwrap();

        assert_eq!(cli.video_id, "dQw4w9WgXcQ");
        assert_eq!(cli.output_file, Some(PathBuf::from("clip")));
        assert_eq!(cli.format, Some(OutputFormat::Srt));
        assert!(cli.verbose);
        assert!(cli.clipboard);
        assert!(!cli.add_timestamps);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["yt-transcript-dl", "dQw4w9WgXcQ"]).unwrap();
        assert_eq!(cli.output_file, None);
        assert_eq!(cli.format, None);
        assert!(!cli.verbose);
        assert!(!cli.clipboard);
    }

    #[test]
    fn test_rejects_unknown_format() {
        let err = Cli::try_parse_from(["yt-transcript-dl", "dQw4w9WgXcQ", "--format", "csv"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(" vtt ".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(TranscriptError::InvalidFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn test_extensions() {
        assert_eq!(OutputFormat::Text.extension(), ".txt");
        assert_eq!(OutputFormat::Json.extension(), ".json");
        assert_eq!(OutputFormat::Srt.extension(), ".srt");
        assert_eq!(OutputFormat::Vtt.extension(), ".vtt");
    }
}
