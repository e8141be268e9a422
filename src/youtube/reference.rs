//! Video identifier extraction from YouTube links.

use crate::error::{InnsiktError, Result};
use serde::{Deserialize, Serialize};

/// Marker for `https://youtu.be/<id>` short links.
const SHORT_LINK_MARKER: &str = "youtu.be";
/// Marker for `https://www.youtube.com/watch?v=<id>` links.
const CANONICAL_MARKER: &str = "youtube.com";
/// Query key carrying the identifier in canonical links.
const VIDEO_QUERY_KEY: &str = "v=";

/// A parsed link to a hosted video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReference {
    raw_url: String,
    video_id: String,
}

impl VideoReference {
    /// Parse a user-supplied URL into a video reference.
    ///
    /// Short links take the final path segment; canonical links take the
    /// value of the `v` query key up to the next parameter. Anything else is
    /// rejected rather than guessed at.
    pub fn parse(raw_url: &str) -> Result<Self> {
        let trimmed = raw_url.trim();

        let video_id = if trimmed.contains(SHORT_LINK_MARKER) {
            let last_segment = trimmed.rsplit('/').next().unwrap_or_default();
            strip_trailing(last_segment, &['?', '#']).to_string()
        } else if trimmed.contains(CANONICAL_MARKER) && trimmed.contains(VIDEO_QUERY_KEY) {
            match url::Url::parse(trimmed) {
                Ok(url) => query_video_id(&url).unwrap_or_default(),
                // Scheme-less input such as "www.youtube.com/watch?v=...".
                Err(_) => {
                    let after_key = trimmed
                        .split_once(VIDEO_QUERY_KEY)
                        .map(|(_, rest)| rest)
                        .unwrap_or_default();
                    strip_trailing(after_key, &['&', '#']).to_string()
                }
            }
        } else {
            return Err(InnsiktError::InvalidInput(format!(
                "unrecognized URL format: {}. Please provide a valid YouTube link.",
                trimmed
            )));
        };

        if video_id.is_empty() {
            return Err(InnsiktError::InvalidInput(format!(
                "no video ID found in URL: {}",
                trimmed
            )));
        }

        Ok(Self {
            raw_url: raw_url.to_string(),
            video_id,
        })
    }

    /// The URL as the user supplied it.
    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    /// The canonical video identifier.
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Canonical watch page for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    /// Preview image served by YouTube for this video.
    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/0.jpg", self.video_id)
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.video_id)
    }
}

impl std::str::FromStr for VideoReference {
    type Err = InnsiktError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Value of the `v` query pair, if present.
fn query_video_id(url: &url::Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.trim().to_string())
}

/// Cut `input` at the first of `delimiters`.
fn strip_trailing<'a>(input: &'a str, delimiters: &[char]) -> &'a str {
    match input.find(delimiters) {
        Some(pos) => &input[..pos],
        None => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_short_link() {
        let reference = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(reference.video_id(), "dQw4w9WgXcQ");
        assert_eq!(reference.raw_url(), "https://youtu.be/dQw4w9WgXcQ");
    }

    #[test]
    fn test_short_link_with_parameters() {
        let reference = VideoReference::parse("https://youtu.be/5_EJwYeQusM?feature=shared").unwrap();
        assert_eq!(reference.video_id(), "5_EJwYeQusM");

        let reference = VideoReference::parse("youtu.be/abc-123?t=30#comments").unwrap();
        assert_eq!(reference.video_id(), "abc-123");
    }

    #[test]
    fn test_canonical_link() {
        let reference =
            VideoReference::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(reference.video_id(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_canonical_link_strips_extra_parameters() {
        let reference = VideoReference::parse(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLrAXtmRdnEQy&t=42s",
        )
        .unwrap();
        assert_eq!(reference.video_id(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_canonical_link_ignores_keys_ending_in_v() {
        let reference =
            VideoReference::parse("https://www.youtube.com/watch?dev=1&v=dQw4w9WgXcQ").unwrap();
        assert_eq!(reference.video_id(), "dQw4w9WgXcQ");

        let err = VideoReference::parse("https://www.youtube.com/watch?rev=2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_canonical_link_without_scheme() {
        let reference = VideoReference::parse("www.youtube.com/watch?v=dQw4w9WgXcQ&t=1").unwrap();
        assert_eq!(reference.video_id(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_surrounding_whitespace() {
        let reference = VideoReference::parse("  https://youtu.be/dQw4w9WgXcQ\n").unwrap();
        assert_eq!(reference.video_id(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_unrecognized_urls() {
        for input in [
            "https://vimeo.com/123456789",
            "https://www.youtube.com/playlist?list=PLrAXtmRdnEQy",
            "dQw4w9WgXcQ",
            "",
        ] {
            let err = VideoReference::parse(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "input: {:?}", input);
        }
    }

    #[test]
    fn test_empty_identifier() {
        assert!(VideoReference::parse("https://youtu.be/").is_err());
        assert!(VideoReference::parse("https://www.youtube.com/watch?v=&list=x").is_err());
    }

    #[test]
    fn test_derived_urls() {
        let reference: VideoReference = "https://youtu.be/dQw4w9WgXcQ".parse().unwrap();
        assert_eq!(reference.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(
            reference.thumbnail_url(),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/0.jpg"
        );
        assert_eq!(reference.to_string(), "dQw4w9WgXcQ");
    }
}
