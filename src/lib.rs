//! YouTube Transcript Downloader - fetch a video's captions and reformat them
//!
//! This library resolves a video ID from a URL or bare identifier, fetches the
//! caption track from YouTube, renders it as plain text, JSON, SRT or WebVTT and
//! dispatches the result to stdout, a file and/or the system clipboard.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod transcript;
pub mod utils;
pub mod video_id;

use std::path::PathBuf;

pub use cli::{Cli, OutputFormat};
pub use config::Config;
pub use output::{format_transcript, Clipboard, FileSink, FsFileSink, OutputDispatcher, OutputRequest};
pub use pipeline::{RunOptions, TranscriptPipeline};
pub use transcript::{CaptionEntry, FetchError, TranscriptFetcher};
pub use video_id::{extract_video_id, VideoId};

/// Result type used throughout the library
pub type Result<T, E = TranscriptError> = std::result::Result<T, E>;

/// Error types specific to the transcript downloader.
///
/// Every variant is terminal: the binary reports it once and exits with code 1.
/// Underlying causes are exposed through `source()`, so print with `{:#}` via
/// `anyhow` to get the full chain.
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Invalid YouTube URL or video ID: {0}")]
    InvalidIdentifier(String),

    #[error("Error fetching transcript for {video_id}")]
    Fetch {
        video_id: String,
        #[source]
        source: FetchError,
    },

    #[error("Invalid format type: {0}")]
    InvalidFormat(String),

    #[error("Error saving file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error writing to console")]
    Console(#[source] std::io::Error),

    #[error("Error copying to clipboard: {0}")]
    Clipboard(String),

    #[error("Error serializing transcript")]
    Serialize(#[from] serde_json::Error),
}
