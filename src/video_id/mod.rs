use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::{Result, TranscriptError};

/// `v=` or `/` followed by an 11 character ID, as found in watch, short, embed and shorts URLs
static URL_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap());

/// The whole input is a bare ID
static BARE_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9A-Za-z_-]{11})$").unwrap());

/// Canonical 11 character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract the video ID from a URL, or return the input if it already is an ID.
///
/// URL forms are tried before the bare ID form; the first match wins.
pub fn extract_video_id(url_or_id: &str) -> Result<VideoId> {
    [&*URL_ID_REGEX, &*BARE_ID_REGEX]
        .iter()
        .find_map(|pattern| pattern.captures(url_or_id))
        .and_then(|captures| captures.get(1))
        .map(|id| VideoId(id.as_str().to_string()))
        .ok_or_else(|| TranscriptError::InvalidIdentifier(url_or_id.to_string()))
}
