use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::captions::parse_timedtext;
use super::{CaptionEntry, FetchError, TranscriptFetcher};
use crate::config::FetchConfig;
use crate::video_id::VideoId;

static API_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap());

/// Markers of a watch page rendered for a removed or unknown video
const UNAVAILABLE_MARKERS: [&str; 3] = [
    "class=\"yt-player-error\"",
    "This video is unavailable",
    "\"status\":\"ERROR\"",
];

/// Skips the EU cookie consent interstitial
const CONSENT_COOKIE: &str = "CONSENT=YES+cb";

const PLAYER_CLIENT_NAME: &str = "ANDROID";
const PLAYER_CLIENT_VERSION: &str = "20.10.38";

/// YouTube transcript fetcher using the innertube player API
pub struct YoutubeTranscriptFetcher {
    client: Client,
    base_url: String,
    accept_language: String,
    languages: Vec<String>,
}

impl YoutubeTranscriptFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            accept_language: config.accept_language.clone(),
            languages: config.languages.clone(),
        })
    }

    /// Load the watch page and pull the innertube API key out of it
    async fn fetch_api_key(&self, video_id: &VideoId) -> Result<String, FetchError> {
        let url = format!("{}/watch?v={}", self.base_url, video_id);
        tracing::debug!("Fetching watch page: {}", url);

        let html = self
            .client
            .get(&url)
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .header(COOKIE, CONSENT_COOKIE)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if html.contains("class=\"g-recaptcha\"") {
            return Err(FetchError::TooManyRequests);
        }

        if let Some(caps) = API_KEY_REGEX.captures(&html) {
            return Ok(caps[1].to_string());
        }

        if UNAVAILABLE_MARKERS.iter().any(|marker| html.contains(marker)) {
            return Err(FetchError::VideoUnavailable);
        }

        Err(FetchError::InvalidResponse(
            "could not find the innertube API key".to_string(),
        ))
    }

    /// Query the player endpoint for playability and caption tracks
    async fn fetch_player(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<PlayerResponse, FetchError> {
        let url = format!("{}/youtubei/v1/player?key={}", self.base_url, api_key);
        tracing::debug!("Querying player endpoint for {}", video_id);

        let body = json!({
            "context": {
                "client": {
                    "clientName": PLAYER_CLIENT_NAME,
                    "clientVersion": PLAYER_CLIENT_VERSION,
                }
            },
            "videoId": video_id.as_str(),
        });

        let response = self
            .client
            .post(&url)
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<PlayerResponse>()
            .await?;

        Ok(response)
    }

    /// Download a caption track and parse it
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionEntry>, FetchError> {
        let url = caption_url(&self.base_url, &track.base_url)?;
        tracing::debug!("Downloading {} caption track", track.language_code);

        let payload = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_timedtext(&payload)
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeTranscriptFetcher {
    async fn fetch(&self, video_id: &VideoId) -> Result<Vec<CaptionEntry>, FetchError> {
        let api_key = self.fetch_api_key(video_id).await?;
        let player = self.fetch_player(video_id, &api_key).await?;

        check_playability(player.playability_status.as_ref())?;

        let tracks = player
            .captions
            .and_then(|captions| captions.tracklist)
            .map(|tracklist| tracklist.caption_tracks)
            .unwrap_or_default();

        if tracks.is_empty() {
            return Err(FetchError::TranscriptsDisabled);
        }

        let track = select_track(&tracks, &self.languages)?;
        tracing::info!(
            "Using {} transcript ({})",
            track.language_code,
            if track.is_generated() { "auto-generated" } else { "manual" }
        );

        self.fetch_track(track).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

fn check_playability(status: Option<&PlayabilityStatus>) -> Result<(), FetchError> {
    let Some(status) = status else {
        return Ok(());
    };
    let reason = status.reason.clone().unwrap_or_default();

    match status.status.as_str() {
        "OK" => Ok(()),
        "LOGIN_REQUIRED" if reason.contains("not a bot") => Err(FetchError::RequestBlocked),
        "LOGIN_REQUIRED" if reason.contains("inappropriate") => Err(FetchError::AgeRestricted),
        "ERROR" => Err(FetchError::VideoUnavailable),
        other if reason.is_empty() => Err(FetchError::Unplayable(other.to_string())),
        _ => Err(FetchError::Unplayable(reason)),
    }
}

/// For each preferred language: a manually created track first, then an auto-generated one
fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Result<&'a CaptionTrack, FetchError> {
    languages
        .iter()
        .find_map(|lang| {
            let matching = |generated: bool| {
                tracks
                    .iter()
                    .find(|t| &t.language_code == lang && t.is_generated() == generated)
            };
            matching(false).or_else(|| matching(true))
        })
        .ok_or_else(|| FetchError::NoTranscriptFound {
            requested: languages.to_vec(),
            available: tracks.iter().map(|t| t.language_code.clone()).collect(),
        })
}

/// Resolve a track URL against the base URL and drop the `fmt` parameter so the
/// default timedtext XML is served
fn caption_url(base_url: &str, track_url: &str) -> Result<Url, FetchError> {
    let invalid = |e: url::ParseError| FetchError::InvalidResponse(format!("bad caption URL: {e}"));

    let mut url = Url::parse(base_url).map_err(invalid)?.join(track_url).map_err(invalid)?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video_id::extract_video_id;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ID: &str = "dQw4w9WgXcQ";
    const WATCH_PAGE: &str =
        r#"<html><script>ytcfg.set({"INNERTUBE_API_KEY":"test-key_123","OTHER":1});</script></html>"#;
    const TIMEDTEXT: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0" dur="2">Hello</text><text start="2" dur="3">World</text></transcript>"#;

    fn track(lang: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("/api/timedtext?lang={lang}"),
            language_code: lang.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    fn fetcher_for(server: &MockServer) -> YoutubeTranscriptFetcher {
        let config = FetchConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            ..Default::default()
        };
        YoutubeTranscriptFetcher::new(&config).unwrap()
    }

    async fn mount_watch_page(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", ID))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_player(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/player"))
            .and(query_param("key", "test-key_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetches_and_parses_transcript() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_PAGE).await;
        mount_player(
            &server,
            json!({
                "playabilityStatus": { "status": "OK" },
                "captions": { "playerCaptionsTracklistRenderer": { "captionTracks": [
                    { "baseUrl": format!("{}/api/timedtext?v={ID}&lang=en&fmt=srv3", server.uri()), "languageCode": "en" }
                ]}}
            }),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TIMEDTEXT))
            .mount(&server)
            .await;

        let entries = fetcher_for(&server)
            .fetch(&extract_video_id(ID).unwrap())
            .await
            .unwrap();

        assert_eq!(
            entries,
            vec![
                CaptionEntry::new("Hello", 0.0, 2.0),
                CaptionEntry::new("World", 2.0, 3.0),
            ]
        );

        let requests = server.received_requests().await.unwrap();
        let caption_request = requests
            .iter()
            .find(|r| r.url.path() == "/api/timedtext")
            .unwrap();
        assert!(caption_request.url.query_pairs().all(|(k, _)| k != "fmt"));
        assert!(caption_request.url.query_pairs().any(|(k, v)| k == "lang" && v == "en"));
    }

    #[tokio::test]
    async fn reports_disabled_transcripts() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_PAGE).await;
        mount_player(&server, json!({ "playabilityStatus": { "status": "OK" } })).await;

        let err = fetcher_for(&server)
            .fetch(&extract_video_id(ID).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::TranscriptsDisabled));
    }

    #[tokio::test]
    async fn reports_unavailable_video() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_PAGE).await;
        mount_player(
            &server,
            json!({ "playabilityStatus": { "status": "ERROR", "reason": "This video is unavailable" } }),
        )
        .await;

        let err = fetcher_for(&server)
            .fetch(&extract_video_id(ID).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::VideoUnavailable));
    }

    #[tokio::test]
    async fn reports_captcha_page() {
        let server = MockServer::start().await;
        mount_watch_page(&server, r#"<div class="g-recaptcha"></div>"#).await;

        let err = fetcher_for(&server)
            .fetch(&extract_video_id(ID).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::TooManyRequests));
    }

    #[tokio::test]
    async fn reports_missing_api_key() {
        let server = MockServer::start().await;
        mount_watch_page(&server, "<html></html>").await;

        let err = fetcher_for(&server)
            .fetch(&extract_video_id(ID).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn reports_unavailable_watch_page() {
        let server = MockServer::start().await;
        mount_watch_page(
            &server,
            r#"<div class="yt-player-error">Video unavailable. This video is unavailable.</div>"#,
        )
        .await;

        let err = fetcher_for(&server)
            .fetch(&extract_video_id(ID).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::VideoUnavailable));

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.url.path() == "/watch"));
    }

    #[tokio::test]
    async fn reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = fetcher_for(&server)
            .fetch(&extract_video_id(ID).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }

    #[test]
    fn playability_mapping() {
        let status = |s: &str, r: Option<&str>| PlayabilityStatus {
            status: s.to_string(),
            reason: r.map(str::to_string),
        };

        assert!(check_playability(None).is_ok());
        assert!(check_playability(Some(&status("OK", None))).is_ok());
        assert!(matches!(
            check_playability(Some(&status("LOGIN_REQUIRED", Some("Sign in to confirm you’re not a bot")))),
            Err(FetchError::RequestBlocked)
        ));
        assert!(matches!(
            check_playability(Some(&status(
                "LOGIN_REQUIRED",
                Some("This video may be inappropriate for some users.")
            ))),
            Err(FetchError::AgeRestricted)
        ));
        assert!(matches!(
            check_playability(Some(&status("LOGIN_REQUIRED", Some("This video is private")))),
            Err(FetchError::Unplayable(r)) if r == "This video is private"
        ));
        assert!(matches!(
            check_playability(Some(&status("ERROR", Some("This video is private")))),
            Err(FetchError::VideoUnavailable)
        ));
        assert!(matches!(
            check_playability(Some(&status("ERROR", None))),
            Err(FetchError::VideoUnavailable)
        ));
        assert!(matches!(
            check_playability(Some(&status("UNPLAYABLE", None))),
            Err(FetchError::Unplayable(r)) if r == "UNPLAYABLE"
        ));
    }

    #[test]
    fn track_selection_prefers_manual_then_generated() {
        let languages = vec!["en".to_string()];

        let tracks = vec![track("en", Some("asr")), track("en", None)];
        assert!(!select_track(&tracks, &languages).unwrap().is_generated());

        let tracks = vec![track("de", None), track("en", Some("asr"))];
        let selected = select_track(&tracks, &languages).unwrap();
        assert_eq!(selected.language_code, "en");
        assert!(selected.is_generated());
    }

    #[test]
    fn track_selection_follows_language_order() {
        let tracks = vec![track("en", None), track("de", Some("asr"))];
        let languages = vec!["de".to_string(), "en".to_string()];
        assert_eq!(select_track(&tracks, &languages).unwrap().language_code, "de");
    }

    #[test]
    fn track_selection_lists_available_languages() {
        let tracks = vec![track("de", None), track("fr", Some("asr"))];
        let err = select_track(&tracks, &["en".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            FetchError::NoTranscriptFound { available, .. } if available == vec!["de", "fr"]
        ));
    }

    #[test]
    fn caption_url_drops_fmt() {
        let url = caption_url(
            "https://www.youtube.com",
            "https://www.youtube.com/api/timedtext?v=x&fmt=srv3&lang=en",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://www.youtube.com/api/timedtext?v=x&lang=en");

        let url = caption_url("https://www.youtube.com", "/api/timedtext?fmt=json3").unwrap();
        assert_eq!(url.as_str(), "https://www.youtube.com/api/timedtext");
    }
}
