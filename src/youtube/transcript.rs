//! Transcript retrieval for YouTube videos via yt-dlp captions.

use crate::error::{InnsiktError, Result, TranscriptError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// A single caption line with timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Ordered captions for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Caption text joined with single spaces, in playback order.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// End of the last caption, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.start_seconds + s.duration_seconds)
            .fold(0.0_f64, f64::max)
    }
}

/// Source of transcripts for hosted videos.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the transcript for a video ID.
    async fn fetch(&self, video_id: &str) -> Result<Transcript>;
}

/// Fetches captions by asking yt-dlp to write them to a temporary directory.
pub struct YtDlpTranscripts {
    languages: Vec<String>,
    temp_root: Option<PathBuf>,
}

impl YtDlpTranscripts {
    pub fn new(languages: Vec<String>) -> Self {
        Self {
            languages,
            temp_root: None,
        }
    }

    /// Create caption scratch directories under `dir` instead of the system temp dir.
    pub fn with_temp_root(mut self, dir: PathBuf) -> Self {
        self.temp_root = Some(dir);
        self
    }

    fn scratch_dir(&self) -> Result<tempfile::TempDir> {
        let dir = match &self.temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                tempfile::Builder::new().prefix("captions-").tempdir_in(root)?
            }
            None => tempfile::Builder::new().prefix("innsikt-captions-").tempdir()?,
        };
        Ok(dir)
    }
}

impl Default for YtDlpTranscripts {
    fn default() -> Self {
        Self::new(vec!["en".to_string()])
    }
}

#[async_trait]
impl TranscriptFetcher for YtDlpTranscripts {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        let scratch = self.scratch_dir()?;
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let template = scratch.path().join("%(id)s.%(ext)s");
        let sub_langs = self
            .languages
            .iter()
            .map(|l| format!("{}.*", l))
            .collect::<Vec<_>>()
            .join(",");

        debug!("Requesting captions ({}) for {}", sub_langs, video_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--skip-download",
                "--write-subs",
                "--write-auto-subs",
                "--sub-format",
                "json3",
                "--sub-langs",
                &sub_langs,
                "--no-warnings",
                "-o",
            ])
            .arg(&template)
            .arg(&url)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InnsiktError::ToolNotFound("yt-dlp".to_string())
                } else {
                    InnsiktError::from(TranscriptError::Fetch {
                        video_id: video_id.to_string(),
                        message: format!("Failed to run yt-dlp: {}", e),
                    })
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptError::Fetch {
                video_id: video_id.to_string(),
                message: stderr.trim().to_string(),
            }
            .into());
        }

        let caption_file = find_caption_file(scratch.path(), &self.languages)?
            .ok_or_else(|| TranscriptError::CaptionsDisabled(video_id.to_string()))?;

        let content = tokio::fs::read_to_string(&caption_file).await?;
        let segments = parse_json3(&content)?;

        if segments.is_empty() {
            return Err(TranscriptError::CaptionsDisabled(video_id.to_string()).into());
        }

        info!(
            "Fetched {} caption segments for {} from {:?}",
            segments.len(),
            video_id,
            caption_file.file_name()
        );

        Ok(Transcript {
            video_id: video_id.to_string(),
            segments,
        })
    }
}

/// Pick the caption file matching the earliest preferred language.
fn find_caption_file(dir: &Path, languages: &[String]) -> Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json3"))
        .collect();
    candidates.sort();

    for language in languages {
        if let Some(found) = candidates
            .iter()
            .find(|p| caption_language(p).starts_with(language.as_str()))
        {
            return Ok(Some(found.clone()));
        }
    }

    Ok(candidates.into_iter().next())
}

/// Language tag from a `<id>.<lang>.json3` file name.
fn caption_language(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| Path::new(stem).extension())
        .map(|lang| lang.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct Json3Captions {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's json3 caption format into ordered segments.
pub fn parse_json3(content: &str) -> Result<Vec<TranscriptSegment>> {
    let captions: Json3Captions = serde_json::from_str(content)
        .map_err(|e| TranscriptError::Malformed(e.to_string()))?;

    let mut segments: Vec<TranscriptSegment> = captions
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|s| s.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                text: text.to_string(),
                start_seconds: event.t_start_ms as f64 / 1000.0,
                duration_seconds: event.d_duration_ms as f64 / 1000.0,
            })
        })
        .collect();

    segments.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "wireMagic": "pb3",
        "events": [
            {"tStartMs": 0, "dDurationMs": 2000, "segs": [{"utf8": "Never gonna"}, {"utf8": " give you up"}]},
            {"tStartMs": 2000, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 2010, "dDurationMs": 0},
            {"tStartMs": 2500, "dDurationMs": 1500, "segs": [{"utf8": "never gonna\nlet you down"}]}
        ]
    }"#;

    #[test]
    fn test_parse_json3_drops_empty_events() {
        let segments = parse_json3(SAMPLE).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Never gonna give you up");
        assert_eq!(segments[1].text, "never gonna let you down");
        assert_eq!(segments[1].start_seconds, 2.5);
        assert_eq!(segments[1].duration_seconds, 1.5);
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        let err = parse_json3("<transcript/>").unwrap_err();
        assert!(matches!(
            err,
            InnsiktError::Transcript(TranscriptError::Malformed(_))
        ));
    }

    #[test]
    fn test_transcript_text_joins_in_order() {
        let transcript = Transcript {
            video_id: "abc".to_string(),
            segments: parse_json3(SAMPLE).unwrap(),
        };
        assert_eq!(
            transcript.text(),
            "Never gonna give you up never gonna let you down"
        );
        assert_eq!(transcript.duration_seconds(), 4.0);
    }

    #[test]
    fn test_find_caption_file_prefers_language_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("abc.de.json3"), "{}")?;
        std::fs::write(dir.path().join("abc.en-orig.json3"), "{}")?;
        std::fs::write(dir.path().join("abc.info.json"), "{}")?;

        let languages = vec!["en".to_string(), "de".to_string()];
        let found = find_caption_file(dir.path(), &languages)?.unwrap();
        assert_eq!(found.file_name().unwrap(), "abc.en-orig.json3");

        let languages = vec!["fr".to_string()];
        let found = find_caption_file(dir.path(), &languages)?.unwrap();
        assert_eq!(found.file_name().unwrap(), "abc.de.json3");
        Ok(())
    }

    #[test]
    fn test_find_caption_file_none_when_no_captions() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(find_caption_file(dir.path(), &["en".to_string()])?.is_none());
        Ok(())
    }
}
