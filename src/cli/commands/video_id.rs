//! Video ID command implementation.

use crate::cli::Output;
use crate::youtube::VideoReference;
use anyhow::Result;

/// Run the video-id command.
pub fn run_video_id(url: &str) -> Result<()> {
    let reference = match VideoReference::parse(url) {
        Ok(reference) => reference,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    Output::kv("Video ID", reference.video_id());
    Output::kv("Watch URL", &reference.watch_url());
    Output::kv("Thumbnail", &reference.thumbnail_url());

    Ok(())
}
