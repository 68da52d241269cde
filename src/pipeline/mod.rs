use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::output::{
    format_transcript, Clipboard, FileSink, FsFileSink, OutputDispatcher, OutputRequest,
    SystemClipboard,
};
use crate::transcript::{TranscriptFetcher, YoutubeTranscriptFetcher};
use crate::utils::format_duration;
use crate::video_id::extract_video_id;
use crate::{Result, TranscriptError};

/// Settings for a single invocation, resolved from the command line and config
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub input: String,
    pub output_file: Option<PathBuf>,
    pub format: OutputFormat,
    pub add_timestamps: bool,
    pub verbose: bool,
    pub clipboard: bool,
}

impl RunOptions {
    pub fn from_cli(cli: &Cli, config: &Config) -> Result<Self> {
        Ok(Self {
            input: cli.video_id.clone(),
            output_file: cli.output_file.clone(),
            format: config.resolve_format(cli.format)?,
            add_timestamps: cli.add_timestamps,
            verbose: cli.verbose,
            clipboard: cli.clipboard,
        })
    }
}

/// Main pipeline: extract ID, fetch, format, dispatch
pub struct TranscriptPipeline {
    fetcher: Box<dyn TranscriptFetcher>,
    clipboard: Box<dyn Clipboard>,
    files: Box<dyn FileSink>,
}

impl TranscriptPipeline {
    /// Create a pipeline wired to YouTube, the system clipboard and the filesystem
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let fetcher = YoutubeTranscriptFetcher::new(&config.fetch)
            .context("Failed to create HTTP client")?;

        Ok(Self::with_components(
            Box::new(fetcher),
            Box::new(SystemClipboard::new()),
            Box::new(FsFileSink),
        ))
    }

    pub fn with_components(
        fetcher: Box<dyn TranscriptFetcher>,
        clipboard: Box<dyn Clipboard>,
        files: Box<dyn FileSink>,
    ) -> Self {
        Self {
            fetcher,
            clipboard,
            files,
        }
    }

    /// Run one invocation, writing status lines and content to `console`
    pub async fn run<W: Write>(&self, options: &RunOptions, console: &mut W) -> Result<()> {
        let video_id = extract_video_id(&options.input)?;
        tracing::info!("Fetching transcript for video: {}", video_id);

        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            progress.set_style(style);
        }
        progress.set_message(format!("Fetching transcript for {video_id}..."));
        progress.enable_steady_tick(Duration::from_millis(100));

        let fetched = self.fetcher.fetch(&video_id).await;
        progress.finish_and_clear();

        let entries = fetched.map_err(|source| TranscriptError::Fetch {
            video_id: video_id.to_string(),
            source,
        })?;

        tracing::info!(
            "Fetched {} caption entries spanning {}",
            entries.len(),
            format_duration(entries.last().map(|e| e.end()).unwrap_or_default())
        );

        let content = format_transcript(&entries, options.format, options.add_timestamps)?;
        tracing::debug!("Formatted transcript as {} ({} bytes)", options.format, content.len());

        let request = OutputRequest {
            content: &content,
            format: options.format,
            output_file: options.output_file.as_deref(),
            clipboard: options.clipboard,
            verbose: options.verbose,
        };

        OutputDispatcher::new(self.clipboard.as_ref(), self.files.as_ref())
            .dispatch(&request, console)
            .await?;

        Ok(())
    }
}
