//! Prompt/response orchestration for Innsikt.
//!
//! Composes one instruction from a framing, optional fetched context and the
//! user's query, submits it once to an agent, and returns the text as-is.

use crate::agent::{Agent, ToolAgent, ToolCallRecord};
use crate::config::{AgentProfile, Framing, Prompts, Settings};
use crate::error::{InnsiktError, Result};
use crate::media::{
    check_media_path, upload_and_wait, Attachment, GeminiFiles, MediaKind, MediaUploader,
    PollSettings,
};
use crate::youtube::{TranscriptFetcher, VideoReference, YtDlpTranscripts};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// One user action's worth of input.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    /// Free-text question; must not be blank.
    pub query: String,
    /// Fetched text such as a transcript.
    pub context: Option<String>,
    /// Inline media for multimodal modes.
    pub attachments: Vec<Attachment>,
}

impl AnalysisRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Text produced by the agent, untouched.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub text: String,
    /// Tools the agent used along the way (informational only).
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Runs analyses against an injected agent, transcript source and media uploader.
pub struct Analyzer {
    agent: Arc<dyn Agent>,
    transcripts: Arc<dyn TranscriptFetcher>,
    uploader: Arc<dyn MediaUploader>,
    prompts: Prompts,
    max_inline_bytes: u64,
    upload_poll: PollSettings,
}

impl Analyzer {
    pub fn new(
        agent: Arc<dyn Agent>,
        transcripts: Arc<dyn TranscriptFetcher>,
        uploader: Arc<dyn MediaUploader>,
        prompts: Prompts,
    ) -> Self {
        Self {
            agent,
            transcripts,
            uploader,
            prompts,
            max_inline_bytes: 20 * 1024 * 1024,
            upload_poll: PollSettings::default(),
        }
    }

    /// Wire up the configured agent for `profile`, yt-dlp transcripts, the
    /// Files API uploader and prompts.
    pub fn from_settings(settings: &Settings, profile: &AgentProfile) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let agent = Arc::new(ToolAgent::from_settings(settings, profile)?);
        let transcripts = Arc::new(
            YtDlpTranscripts::new(settings.transcript.languages.clone())
                .with_temp_root(settings.temp_dir()),
        );

        let uploader = Arc::new(GeminiFiles::from_settings(settings)?);

        Ok(Self::new(agent, transcripts, uploader, prompts)
            .with_max_inline_bytes(settings.media.max_inline_bytes)
            .with_upload_poll(settings.media.poll()))
    }

    /// Set the largest image accepted for inline transport.
    pub fn with_max_inline_bytes(mut self, max: u64) -> Self {
        self.max_inline_bytes = max;
        self
    }

    /// Set how uploaded videos are polled while processing.
    pub fn with_upload_poll(mut self, poll: PollSettings) -> Self {
        self.upload_poll = poll;
        self
    }

    /// Submit a request once to the agent.
    ///
    /// With a framing, the prompt is composed around the query; without one,
    /// the query is sent verbatim.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), agent = self.agent.name()))]
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        framing: Option<&Framing>,
    ) -> Result<AnalysisResult> {
        require_query(&request.query)?;

        let prompt = match framing {
            Some(framing) => self.compose(framing, request.context.as_deref(), &request.query),
            None => request.query.clone(),
        };

        info!(
            "Submitting prompt ({} chars, {} attachment(s))",
            prompt.len(),
            request.attachments.len()
        );

        let response = self
            .agent
            .run(&prompt, &request.attachments)
            .await
            .map_err(InnsiktError::into_external)?;

        Ok(AnalysisResult {
            text: response.content,
            tool_calls: response.tool_calls,
        })
    }

    /// Answer a financial question; the question is the whole prompt.
    pub async fn ask_finance(&self, question: &str) -> Result<AnalysisResult> {
        let request = AnalysisRequest::new(question);
        self.analyze(&request, None).await
    }

    /// Answer a question about a YouTube video using its transcript.
    pub async fn analyze_youtube(&self, url: &str, query: &str) -> Result<AnalysisResult> {
        require_query(query)?;
        let reference = VideoReference::parse(url)?;

        let transcript = self
            .transcripts
            .fetch(reference.video_id())
            .await
            .map_err(|e| {
                warn!("Transcript fetch failed for {}: {}", reference, e);
                e.into_external()
            })?;

        info!(
            "Transcript for {} has {} segments covering {:.0}s",
            reference,
            transcript.segments.len(),
            transcript.duration_seconds()
        );

        let request = AnalysisRequest::new(query).with_context(transcript.text());
        self.analyze(&request, Some(&self.prompts.youtube)).await
    }

    /// Answer a question about a local video file.
    ///
    /// The video is uploaded to the provider and handed to the agent by
    /// reference once processing finishes.
    pub async fn analyze_video(&self, path: &Path, query: &str) -> Result<AnalysisResult> {
        require_query(query)?;
        let mime_type = check_media_path(path, MediaKind::Video)?;

        let file = upload_and_wait(self.uploader.as_ref(), path, mime_type, self.upload_poll)
            .await
            .map_err(|e| {
                warn!("Video upload failed for {}: {}", path.display(), e);
                e.into_external()
            })?;

        let request = AnalysisRequest::new(query).with_attachment(Attachment::from_uploaded(&file));
        self.analyze(&request, Some(&self.prompts.video)).await
    }

    /// Analyze a photo of an ingredient label.
    pub async fn analyze_ingredients(
        &self,
        path: &Path,
        query: Option<&str>,
    ) -> Result<AnalysisResult> {
        let framing = &self.prompts.ingredients;
        let query = query
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(framing.default_query.as_str());
        require_query(query)?;
        let image = Attachment::from_path(path, MediaKind::Image, self.max_inline_bytes)?;

        let request = AnalysisRequest::new(query).with_attachment(image);
        self.analyze(&request, Some(framing)).await
    }

    fn compose(&self, framing: &Framing, context: Option<&str>, query: &str) -> String {
        let framing = Framing {
            preamble: self.prompts.render_custom(&framing.preamble),
            closing: self.prompts.render_custom(&framing.closing),
            ..framing.clone()
        };
        compose_prompt(&framing, context, query)
    }
}

/// Build the composite instruction: preamble, context block, query, closing.
pub fn compose_prompt(framing: &Framing, context: Option<&str>, query: &str) -> String {
    let mut sections = Vec::new();

    let preamble = framing.preamble.trim();
    if !preamble.is_empty() {
        sections.push(preamble.to_string());
    }

    if let Some(context) = context {
        sections.push(format!("{}:\n{}", framing.context_label, context.trim()));
    }

    sections.push(format!("User Query: {}", query.trim()));

    let closing = framing.closing.trim();
    if !closing.is_empty() {
        sections.push(closing.to_string());
    }

    sections.join("\n\n")
}

fn require_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(InnsiktError::InvalidInput(
            "Please enter a question or insight to analyze.".to_string(),
        ));
    }
    Ok(())
}
