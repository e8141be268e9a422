//! YouTube link parsing and transcript retrieval.

mod reference;
mod transcript;

pub use reference::VideoReference;
pub use transcript::{parse_json3, Transcript, TranscriptFetcher, TranscriptSegment, YtDlpTranscripts};
