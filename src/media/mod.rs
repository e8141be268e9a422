//! Local media attached to a prompt.
//!
//! Images travel inline as `data:` URLs. Videos are uploaded to the
//! provider's file store first (see [`upload`]) and referenced by URI.

mod upload;

pub use upload::{
    upload_and_wait, wait_until_active, FileState, FileStatus, GeminiFiles, MediaUploader,
    PollSettings, UploadedFile,
};

use crate::error::{InnsiktError, Result};
use base64::{engine::general_purpose, Engine as _};
use std::path::Path;
use tracing::debug;

/// Kind of media an attachment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Where the model reads an attachment's bytes from.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// Bytes carried in the request itself.
    Inline(Vec<u8>),
    /// A file already stored by the provider, addressed by URI.
    Remote(String),
}

/// An image or video passed to the agent alongside the prompt.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub source: MediaSource,
}

impl Attachment {
    /// Load a file of the expected kind inline, rejecting unknown types and oversized files.
    pub fn from_path(path: &Path, expected: MediaKind, max_bytes: u64) -> Result<Self> {
        let mime_type = check_media_path(path, expected)?;

        let size = std::fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(InnsiktError::InvalidInput(format!(
                "{} is {} bytes, larger than the {} byte inline limit",
                path.display(),
                size,
                max_bytes
            )));
        }

        let data = std::fs::read(path)?;
        debug!("Loaded {} ({} bytes, {})", path.display(), data.len(), mime_type);

        Ok(Self {
            file_name: display_name(path),
            mime_type: mime_type.to_string(),
            source: MediaSource::Inline(data),
        })
    }

    /// Reference a file the provider has finished processing.
    pub fn from_uploaded(file: &UploadedFile) -> Self {
        Self {
            file_name: file.display_name.clone().unwrap_or_else(|| file.name.clone()),
            mime_type: file.mime_type.clone(),
            source: MediaSource::Remote(file.uri.clone()),
        }
    }

    /// URL the model fetches the media from: a base64 `data:` URL or the file URI.
    pub fn url(&self) -> String {
        match &self.source {
            MediaSource::Inline(data) => format!(
                "data:{};base64,{}",
                self.mime_type,
                general_purpose::STANDARD.encode(data)
            ),
            MediaSource::Remote(uri) => uri.clone(),
        }
    }
}

/// Validate that `path` is a readable file of the expected kind and return its MIME type.
pub fn check_media_path(path: &Path, expected: MediaKind) -> Result<&'static str> {
    let (kind, mime_type) = mime_for_path(path).ok_or_else(|| {
        InnsiktError::InvalidInput(format!("unsupported file type: {}", path.display()))
    })?;

    if kind != expected {
        return Err(InnsiktError::InvalidInput(format!(
            "expected a {} file, got {}",
            expected,
            path.display()
        )));
    }

    let metadata = std::fs::metadata(path).map_err(|e| {
        InnsiktError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(InnsiktError::InvalidInput(format!(
            "{} is not a file",
            path.display()
        )));
    }

    Ok(mime_type)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Media kind and MIME type inferred from the file extension.
pub fn mime_for_path(path: &Path) -> Option<(MediaKind, &'static str)> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some((MediaKind::Image, "image/jpeg")),
        "png" => Some((MediaKind::Image, "image/png")),
        "webp" => Some((MediaKind::Image, "image/webp")),
        "mp4" => Some((MediaKind::Video, "video/mp4")),
        "mov" => Some((MediaKind::Video, "video/quicktime")),
        "avi" => Some((MediaKind::Video, "video/x-msvideo")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(
            mime_for_path(Path::new("label.JPG")),
            Some((MediaKind::Image, "image/jpeg"))
        );
        assert_eq!(
            mime_for_path(Path::new("/tmp/clip.mov")),
            Some((MediaKind::Video, "video/quicktime"))
        );
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_from_path_and_data_url() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("label.png");
        std::fs::write(&path, b"png")?;

        let attachment = Attachment::from_path(&path, MediaKind::Image, 1024)?;
        assert_eq!(attachment.file_name, "label.png");
        assert_eq!(attachment.url(), "data:image/png;base64,cG5n");
        Ok(())
    }

    #[test]
    fn test_from_path_rejects_wrong_kind_and_size() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, vec![0u8; 64])?;

        let err = Attachment::from_path(&video, MediaKind::Image, 1024).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let image = dir.path().join("label.png");
        std::fs::write(&image, vec![0u8; 64])?;
        let err = Attachment::from_path(&image, MediaKind::Image, 16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let missing = dir.path().join("missing.mp4");
        let err = check_media_path(&missing, MediaKind::Video).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert_eq!(check_media_path(&video, MediaKind::Video)?, "video/mp4");
        Ok(())
    }

    #[test]
    fn test_uploaded_attachment_uses_file_uri() {
        let file = UploadedFile {
            name: "files/abc123".to_string(),
            display_name: Some("clip.mp4".to_string()),
            uri: "https://generativelanguage.googleapis.com/v1beta/files/abc123".to_string(),
            mime_type: "video/mp4".to_string(),
            state: FileState::Active,
            error: None,
        };
        let attachment = Attachment::from_uploaded(&file);
        assert_eq!(attachment.file_name, "clip.mp4");
        assert_eq!(attachment.url(), file.uri);
    }
}
