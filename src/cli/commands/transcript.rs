//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{normalize_video_id, TranscriptFetcher, YoutubeTranscriptSource};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Run the transcript command.
pub async fn run_transcript(video: &str, output: Option<String>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Transcript, &settings)?;

    let video_id = normalize_video_id(video);
    if video_id.is_empty() {
        anyhow::bail!("A video ID or URL is required");
    }

    let source = Arc::new(YoutubeTranscriptSource::new(Duration::from_secs(
        settings.transcript.http_timeout_seconds,
    ))?);
    let fetcher = TranscriptFetcher::new(source, settings.transcript.languages.clone());

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video_id));
    let transcript = match fetcher.fetch(&video_id).await {
        Ok(t) => {
            spinner.finish_and_clear();
            t
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, &transcript.text)?;
            Output::success(&format!(
                "Wrote '{}' transcript ({} chars) to {}",
                transcript.language_code,
                transcript.char_len(),
                path.display()
            ));
        }
        None => println!("{}", transcript.text),
    }

    Ok(())
}
