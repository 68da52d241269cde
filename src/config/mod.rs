use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::cli::OutputFormat;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcript provider settings
    pub fetch: FetchConfig,

    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Base URL of the YouTube frontend
    pub base_url: String,

    /// Request timeout in seconds, applied to every provider call
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Accept-Language header for the watch page
    pub accept_language: String,

    /// Caption track languages in order of preference
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when `--format` is not given
    pub default_format: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            timeout_secs: 30,
            user_agent: concat!("yt-transcript-dl/", env!("CARGO_PKG_VERSION")).to_string(),
            accept_language: "en-US".to_string(),
            languages: vec!["en".to_string()],
        }
    }
}

impl FetchConfig {
    /// Request timeout for provider calls
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Text.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, the user config directory, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.exists()),
        };

        match path {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Read and validate a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", path.display());

        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Get configuration file path
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("yt-transcript-dl").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be greater than zero");
        }

        let base = Url::parse(&self.fetch.base_url)
            .with_context(|| format!("Invalid fetch.base_url: {}", self.fetch.base_url))?;

        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("fetch.base_url must use HTTP or HTTPS protocol");
        }

        Ok(())
    }

    /// Resolve the effective output format, preferring the command line choice
    pub fn resolve_format(&self, cli: Option<OutputFormat>) -> crate::Result<OutputFormat> {
        match cli {
            Some(format) => Ok(format),
            None => self.output.default_format.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TranscriptError;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetch.base_url, "https://www.youtube.com");
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.fetch.languages, vec!["en".to_string()]);
        assert_eq!(config.output.default_format, "text");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config("output:\n  default_format: srt\n");
        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.output.default_format, "srt");
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.resolve_format(None).unwrap(), OutputFormat::Srt);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let file = write_config("fetch:\n  timeout_secs: 0\n");
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let file = write_config("fetch:\n  base_url: ftp://example.com\n");
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/yt-transcript-dl.yaml"))).is_err());
    }

    #[test]
    fn test_resolve_format() {
        let mut config = Config::default();
        assert_eq!(
            config.resolve_format(Some(OutputFormat::Vtt)).unwrap(),
            OutputFormat::Vtt
        );
        assert_eq!(config.resolve_format(None).unwrap(), OutputFormat::Text);

        config.output.default_format = "docx".to_string();
        assert!(matches!(
            config.resolve_format(None),
            Err(TranscriptError::InvalidFormat(_))
        ));
        // An explicit flag wins over a bad default
        assert!(config.resolve_format(Some(OutputFormat::Json)).is_ok());
    }

    #[test]
    fn test_timeout() {
        assert_eq!(Config::default().fetch.timeout(), Duration::from_secs(30));

        let file = write_config("fetch:\n  timeout_secs: 7\n");
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.fetch.timeout(), Duration::from_secs(7));
    }
}
