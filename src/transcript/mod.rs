use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod captions;
pub mod youtube;

pub use youtube::YoutubeTranscriptFetcher;

use crate::video_id::VideoId;

/// One timed line of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    /// Caption text, exactly as delivered by the provider after entity decoding
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl CaptionEntry {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End offset in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Reasons a transcript could not be retrieved from the provider
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("the video is no longer available")]
    VideoUnavailable,

    #[error("subtitles are disabled for this video")]
    TranscriptsDisabled,

    #[error("no transcript found for languages {requested:?}, available: {available:?}")]
    NoTranscriptFound {
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("YouTube is blocking requests from this IP")]
    RequestBlocked,

    #[error("too many requests, YouTube answered with a captcha")]
    TooManyRequests,

    #[error("the video is age restricted and requires sign-in")]
    AgeRestricted,

    #[error("the video is unplayable: {0}")]
    Unplayable(String),

    #[error("unexpected response from YouTube: {0}")]
    InvalidResponse(String),

    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),
}

/// Capability for fetching the caption entries of a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the transcript, ordered by start time. A single attempt, no retries.
    async fn fetch(&self, video_id: &VideoId) -> Result<Vec<CaptionEntry>, FetchError>;
}
