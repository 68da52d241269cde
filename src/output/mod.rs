use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::utils::with_default_extension;
use crate::{Result, TranscriptError};

pub mod clipboard;
pub mod formatters;

pub use clipboard::SystemClipboard;
pub use formatters::*;

/// Width of the rule printed around echoed content
const SEPARATOR: &str = "----------------------------------------";

/// Capability for placing text on the system clipboard
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy(&self, text: &str) -> anyhow::Result<()>;
}

/// Capability for writing the transcript to a file, overwriting it
#[cfg_attr(test, mockall::automock)]
pub trait FileSink: Send + Sync {
    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()>;
}

/// Writes files to the local filesystem
pub struct FsFileSink;

impl FileSink for FsFileSink {
    fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        fs_err::write(path, contents)
    }
}

/// What to do with one formatted transcript
#[derive(Debug, Clone)]
pub struct OutputRequest<'a> {
    pub content: &'a str,
    pub format: OutputFormat,
    pub output_file: Option<&'a Path>,
    pub clipboard: bool,
    pub verbose: bool,
}

/// Sends formatted text to the clipboard, a file and/or the console.
///
/// Clipboard copy happens before the file write. Console output is written to
/// the supplied writer so callers can capture it.
pub struct OutputDispatcher<'a> {
    clipboard: &'a dyn Clipboard,
    files: &'a dyn FileSink,
}

impl<'a> OutputDispatcher<'a> {
    pub fn new(clipboard: &'a dyn Clipboard, files: &'a dyn FileSink) -> Self {
        Self { clipboard, files }
    }

    /// Dispatch the content; returns the file path actually written, if any
    pub async fn dispatch<W: Write>(
        &self,
        request: &OutputRequest<'_>,
        console: &mut W,
    ) -> Result<Option<PathBuf>> {
        let output_file = request
            .output_file
            .map(|path| with_default_extension(path, request.format));

        if request.clipboard {
            self.clipboard
                .copy(request.content)
                .await
                .map_err(|e| TranscriptError::Clipboard(format!("{e:#}")))?;
            tracing::info!("Copied transcript to clipboard");
            writeln!(console, "Transcript copied to clipboard").map_err(TranscriptError::Console)?;
        }

        match &output_file {
            Some(path) => {
                self.files
                    .write(path, request.content)
                    .map_err(|source| TranscriptError::Io {
                        path: path.clone(),
                        source,
                    })?;
                tracing::info!("Wrote transcript to {}", path.display());
                writeln!(console, "Transcript saved to {}", path.display())
                    .map_err(TranscriptError::Console)?;

                if request.verbose {
                    echo_content(console, request.content).map_err(TranscriptError::Console)?;
                }
            }
            None if !request.clipboard => {
                writeln!(console, "{}", request.content).map_err(TranscriptError::Console)?;
            }
            None => {
                if request.verbose {
                    echo_content(console, request.content).map_err(TranscriptError::Console)?;
                }
            }
        }

        Ok(output_file)
    }
}

fn echo_content<W: Write>(console: &mut W, content: &str) -> std::io::Result<()> {
    writeln!(console, "\nTranscript content:")?;
    writeln!(console, "{SEPARATOR}")?;
    writeln!(console, "{content}")?;
    writeln!(console, "{SEPARATOR}")
}
