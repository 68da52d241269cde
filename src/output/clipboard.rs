use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Clipboard;

/// An external program that reads clipboard content from stdin
#[derive(Debug, Clone)]
pub struct ClipboardTool {
    pub program: String,
    pub args: Vec<String>,
}

impl ClipboardTool {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

/// System clipboard backed by the platform's copy utilities
pub struct SystemClipboard {
    tools: Vec<ClipboardTool>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::with_tools(Self::platform_tools())
    }

    pub fn with_tools(tools: Vec<ClipboardTool>) -> Self {
        Self { tools }
    }

    fn platform_tools() -> Vec<ClipboardTool> {
        if cfg!(target_os = "macos") {
            vec![ClipboardTool::new("pbcopy", &[])]
        } else if cfg!(target_os = "windows") {
            vec![ClipboardTool::new("clip.exe", &[])]
        } else {
            vec![
                ClipboardTool::new("wl-copy", &[]),
                ClipboardTool::new("xclip", &["-selection", "clipboard"]),
                ClipboardTool::new("xsel", &["--clipboard", "--input"]),
            ]
        }
    }

    /// Pipe `text` into one tool. `Ok(false)` means the tool is not installed.
    async fn try_tool(tool: &ClipboardTool, text: &str) -> Result<bool> {
        let spawned = Command::new(&tool.program)
            .args(&tool.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let written = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(text.as_bytes()).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            },
            None => Ok(()),
        };

        // Reap the tool even when it closed its input early
        let status = child.wait().await?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", tool.program, status);
        }
        written.with_context(|| format!("failed to write to {}", tool.program))?;

        Ok(true)
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn copy(&self, text: &str) -> Result<()> {
        let mut failures = Vec::new();

        for tool in &self.tools {
            match Self::try_tool(tool, text).await {
                Ok(true) => {
                    tracing::debug!("Copied {} bytes with {}", text.len(), tool.program);
                    return Ok(());
                }
                Ok(false) => tracing::debug!("{} not available", tool.program),
                Err(e) => {
                    tracing::debug!("{} failed: {:#}", tool.program, e);
                    failures.push(format!("{}: {:#}", tool.program, e));
                }
            }
        }

        if failures.is_empty() {
            let tried: Vec<&str> = self.tools.iter().map(|t| t.program.as_str()).collect();
            anyhow::bail!(
                "no clipboard mechanism available (tried {})",
                tried.join(", ")
            );
        }

        anyhow::bail!(failures.join("; "))
    }
}
