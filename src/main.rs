use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcript_dl::{Cli, Config, RunOptions, TranscriptPipeline};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing; stdout is reserved for the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yt_transcript_dl=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let options = RunOptions::from_cli(&cli, &config)?;

    let pipeline = TranscriptPipeline::new(&config)?;

    let stdout = std::io::stdout();
    let mut console = stdout.lock();
    pipeline.run(&options, &mut console).await?;

    Ok(())
}
