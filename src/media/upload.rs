//! Provider-side file storage for videos.
//!
//! Videos go through Gemini's Files API: a resumable upload, then polling
//! until the provider has finished processing the file.

use crate::config::Settings;
use crate::error::{InnsiktError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Processing state reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[default]
    StateUnspecified,
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Why processing failed, when the provider says.
#[derive(Debug, Clone, Deserialize)]
pub struct FileStatus {
    #[serde(default)]
    pub message: String,
}

/// A file stored by the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Resource name, e.g. `files/abc123`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// URI the model reads the file from.
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: FileState,
    #[serde(default)]
    pub error: Option<FileStatus>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

/// Uploads media and reports its processing state.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload a local file.
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<UploadedFile>;

    /// Current metadata for an uploaded file.
    async fn get(&self, name: &str) -> Result<UploadedFile>;
}

/// How often and how long to wait for processing.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Upload a file and wait until the provider can serve it.
#[instrument(skip_all, fields(path = %path.display(), mime_type = %mime_type))]
pub async fn upload_and_wait(
    uploader: &dyn MediaUploader,
    path: &Path,
    mime_type: &str,
    poll: PollSettings,
) -> Result<UploadedFile> {
    let file = uploader.upload(path, mime_type).await?;
    info!("Uploaded {} as {} ({:?})", path.display(), file.name, file.state);
    wait_until_active(uploader, file, poll).await
}

/// Poll while the file is processing. A failed file is an error.
pub async fn wait_until_active(
    uploader: &dyn MediaUploader,
    file: UploadedFile,
    poll: PollSettings,
) -> Result<UploadedFile> {
    let name = file.name.clone();

    let waiting = async {
        let mut file = file;
        while file.state == FileState::Processing {
            tokio::time::sleep(poll.interval).await;
            file = uploader.get(&file.name).await?;
            debug!("{} is {:?}", file.name, file.state);
        }
        Ok::<_, InnsiktError>(file)
    };

    let file = tokio::time::timeout(poll.timeout, waiting)
        .await
        .map_err(|_| {
            InnsiktError::ExternalService(format!(
                "{} still processing after {}s",
                name,
                poll.timeout.as_secs()
            ))
        })??;

    if file.state == FileState::Failed {
        let reason = file
            .error
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "no reason given".to_string());
        return Err(InnsiktError::ExternalService(format!(
            "processing of {} failed: {}",
            name, reason
        )));
    }

    Ok(file)
}

/// Gemini Files API client.
pub struct GeminiFiles {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiFiles {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Client for the configured files endpoint, authenticated with the model key.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.model.api_key().ok_or_else(|| {
            InnsiktError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                settings.model.api_key_env, settings.model.api_key_env
            ))
        })?;
        let http = crate::openai::http_client(Duration::from_secs(settings.model.timeout_seconds))?;
        Ok(Self::new(http, &settings.media.files_api_base, api_key))
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/v1beta/files", self.base_url)
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, name.trim_start_matches('/'))
    }
}

#[async_trait]
impl MediaUploader for GeminiFiles {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<UploadedFile> {
        let data = tokio::fs::read(path).await?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!("Starting upload of {} ({} bytes)", display_name, data.len());

        let start = self
            .http
            .post(self.upload_url())
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", data.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = check_status(start).await?;

        let session_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                InnsiktError::ExternalService("Files API did not return an upload URL".to_string())
            })?;

        let response = self
            .http
            .post(&session_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(data)
            .send()
            .await?;
        let body: UploadResponse = check_status(response).await?.json().await?;
        Ok(body.file)
    }

    async fn get(&self, name: &str) -> Result<UploadedFile> {
        let response = self
            .http
            .get(self.file_url(name))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(InnsiktError::ExternalService(format!(
        "Files API returned {}: {}",
        status,
        body.trim()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves a scripted sequence of states to `get`.
    struct ScriptedUploader {
        states: Mutex<Vec<FileState>>,
        polls: Mutex<usize>,
    }

    impl ScriptedUploader {
        fn new(states: Vec<FileState>) -> Self {
            Self {
                states: Mutex::new(states),
                polls: Mutex::new(0),
            }
        }
    }

    fn file(state: FileState) -> UploadedFile {
        UploadedFile {
            name: "files/clip".to_string(),
            display_name: None,
            uri: "https://files.example/clip".to_string(),
            mime_type: "video/mp4".to_string(),
            state,
            error: None,
        }
    }

    #[async_trait]
    impl MediaUploader for ScriptedUploader {
        async fn upload(&self, _path: &Path, _mime_type: &str) -> Result<UploadedFile> {
            Ok(file(FileState::Processing))
        }

        async fn get(&self, _name: &str) -> Result<UploadedFile> {
            *self.polls.lock().unwrap() += 1;
            let mut states = self.states.lock().unwrap();
            let state = if states.len() > 1 {
                states.remove(0)
            } else {
                states[0]
            };
            Ok(file(state))
        }
    }

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_deserialize_file() {
        let body = r#"{
            "file": {
                "name": "files/abc123",
                "displayName": "clip.mp4",
                "mimeType": "video/mp4",
                "sizeBytes": "1024",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
                "state": "PROCESSING"
            }
        }"#;
        let response: UploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.file.name, "files/abc123");
        assert_eq!(response.file.state, FileState::Processing);

        let unknown: UploadedFile =
            serde_json::from_str(r#"{"name":"files/x","uri":"u","state":"ARCHIVED"}"#).unwrap();
        assert_eq!(unknown.state, FileState::Unknown);
    }

    #[tokio::test]
    async fn test_polls_until_active() {
        let uploader = ScriptedUploader::new(vec![
            FileState::Processing,
            FileState::Processing,
            FileState::Active,
        ]);
        let done = upload_and_wait(&uploader, Path::new("clip.mp4"), "video/mp4", fast_poll())
            .await
            .unwrap();
        assert_eq!(done.state, FileState::Active);
        assert_eq!(*uploader.polls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_processing_is_external() {
        let uploader = ScriptedUploader::new(vec![FileState::Failed]);
        let err = upload_and_wait(&uploader, Path::new("clip.mp4"), "video/mp4", fast_poll())
            .await
            .unwrap_err();
        assert!(matches!(err, InnsiktError::ExternalService(_)));
        assert!(err.to_string().contains("processing of files/clip failed"));
    }

    #[tokio::test]
    async fn test_gives_up_after_timeout() {
        let uploader = ScriptedUploader::new(vec![FileState::Processing]);
        let poll = PollSettings {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(30),
        };
        let err = wait_until_active(&uploader, file(FileState::Processing), poll)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("still processing"));
    }

    #[test]
    fn test_endpoint_urls() {
        let files = GeminiFiles::new(
            reqwest::Client::new(),
            "https://generativelanguage.googleapis.com/",
            "key",
        );
        assert_eq!(
            files.upload_url(),
            "https://generativelanguage.googleapis.com/upload/v1beta/files"
        );
        assert_eq!(
            files.file_url("files/abc123"),
            "https://generativelanguage.googleapis.com/v1beta/files/abc123"
        );
    }
}
