//! Agent runner with tool calling loop.

use super::{Agent, AgentResponse, ToolCallRecord};
use crate::config::{AgentProfile, Settings};
use crate::error::{InnsiktError, Result};
use crate::media::Attachment;
use crate::openai::create_client;
use crate::tools::{ToolFactory, Toolbox};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// Agent backed by an OpenAI-compatible chat completions endpoint.
pub struct ToolAgent {
    client: Client<OpenAIConfig>,
    model: String,
    profile: AgentProfile,
    tools: Toolbox,
    max_iterations: usize,
}

impl ToolAgent {
    /// Create a new agent for a profile with its tools.
    pub fn new(client: Client<OpenAIConfig>, model: &str, profile: AgentProfile, tools: Toolbox) -> Self {
        Self {
            client,
            model: model.to_string(),
            profile,
            tools,
            max_iterations: 10,
        }
    }

    /// Build an agent for `profile` from the model and tool settings.
    pub fn from_settings(settings: &Settings, profile: &AgentProfile) -> Result<Self> {
        let client = create_client(&settings.model)?;
        let tools = ToolFactory::new(settings)?.toolbox(&profile.tools)?;
        debug!("{} tools: {:?}", profile.name, tools.names());

        Ok(Self::new(client, &settings.model.model, profile.clone(), tools)
            .with_max_iterations(settings.model.max_iterations))
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Opening messages for a run: system instructions, then the prompt with media.
    pub fn initial_messages(
        &self,
        prompt: &str,
        attachments: &[Attachment],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(build_system_message(&self.profile))
            .build()
            .map_err(|e| InnsiktError::Agent(e.to_string()))?;

        let content = if attachments.is_empty() {
            ChatCompletionRequestUserMessageContent::Text(prompt.to_string())
        } else {
            let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(prompt)
                    .build()
                    .map_err(|e| InnsiktError::Agent(e.to_string()))?
                    .into(),
            ];
            for attachment in attachments {
                let image_url = ImageUrlArgs::default()
                    .url(attachment.url())
                    .detail(ImageDetail::Auto)
                    .build()
                    .map_err(|e| InnsiktError::Agent(e.to_string()))?;
                parts.push(
                    ChatCompletionRequestMessageContentPartImageArgs::default()
                        .image_url(image_url)
                        .build()
                        .map_err(|e| InnsiktError::Agent(e.to_string()))?
                        .into(),
                );
            }
            ChatCompletionRequestUserMessageContent::Array(parts)
        };

        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| InnsiktError::Agent(e.to_string()))?;

        Ok(vec![system.into(), user.into()])
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result: self.tools.execute(name, arguments).await,
        }
    }
}

#[async_trait]
impl Agent for ToolAgent {
    fn name(&self) -> &str {
        &self.profile.name
    }

    #[instrument(skip(self, prompt, attachments), fields(agent = %self.profile.name, attachments = attachments.len()))]
    async fn run(&self, prompt: &str, attachments: &[Attachment]) -> Result<AgentResponse> {
        let mut messages = self.initial_messages(prompt, attachments)?;
        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(InnsiktError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let mut request = CreateChatCompletionRequestArgs::default();
            request.model(&self.model).messages(messages.clone());
            if !self.tools.is_empty() {
                request.tools(self.tools.definitions());
            }
            let request = request
                .build()
                .map_err(|e| InnsiktError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| InnsiktError::OpenAI(e.to_string()))?;

            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| InnsiktError::Agent("No response from model".to_string()))?;

            let tool_calls = choice.message.tool_calls.unwrap_or_default();
            if tool_calls.is_empty() {
                info!(
                    "Agent finished after {} iteration(s), {} tool call(s)",
                    iterations,
                    tool_calls_made.len()
                );
                return Ok(AgentResponse {
                    content: choice.message.content.unwrap_or_default(),
                    tool_calls: tool_calls_made,
                    iterations,
                });
            }

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| InnsiktError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in &tool_calls {
                let record = self.execute_tool_call(tool_call).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| InnsiktError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                tool_calls_made.push(record);
            }
        }
    }
}

/// System message for a profile: persona, bullet instructions, output format.
pub fn build_system_message(profile: &AgentProfile) -> String {
    let mut sections = Vec::new();

    if let Some(system_prompt) = profile.system_prompt.as_deref().map(str::trim) {
        if !system_prompt.is_empty() {
            sections.push(system_prompt.to_string());
        }
    }

    if !profile.instructions.is_empty() {
        let bullets = profile
            .instructions
            .iter()
            .map(|i| format!("- {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Instructions:\n{}", bullets));
    }

    if profile.markdown {
        sections.push("Use markdown to format your answers.".to_string());
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentSettings;
    use crate::media::MediaSource;

    fn test_agent(profile: AgentProfile) -> ToolAgent {
        let client = Client::with_config(OpenAIConfig::new().with_api_key("test-key"));
        ToolAgent::new(client, "gemini-2.0-flash-exp", profile, Toolbox::default())
    }

    fn attachment(name: &str, mime: &str) -> Attachment {
        Attachment {
            file_name: name.to_string(),
            mime_type: mime.to_string(),
            source: MediaSource::Inline(vec![1, 2, 3]),
        }
    }

    #[test]
    fn test_build_system_message_finance() {
        let message = build_system_message(&AgentSettings::default().finance);
        assert_eq!(
            message,
            "Instructions:\n\
             - Use DuckDuckGo for web searches.\n\
             - Provide financial data in tabular format.\n\
             - Always include sources for any information provided.\n\n\
             Use markdown to format your answers."
        );
    }

    #[test]
    fn test_build_system_message_with_persona() {
        let message = build_system_message(&AgentSettings::default().ingredients);
        assert!(message.starts_with("You are an expert Food Product Analyst"));
        assert!(message.contains("- Rate nutritional value on a scale of 1-5"));
    }

    #[test]
    fn test_initial_messages_text_only() {
        let agent = test_agent(AgentSettings::default().youtube);
        let messages = agent.initial_messages("What is said?", &[]).unwrap();
        assert_eq!(messages.len(), 2);
        match &messages[1] {
            ChatCompletionRequestMessage::User(user) => match &user.content {
                ChatCompletionRequestUserMessageContent::Text(text) => {
                    assert_eq!(text, "What is said?")
                }
                other => panic!("Expected text content, got {:?}", other),
            },
            other => panic!("Expected user message, got {:?}", other),
        }
    }

    #[test]
    fn test_initial_messages_one_part_per_attachment() {
        let agent = test_agent(AgentSettings::default().ingredients);
        let attachments = vec![
            attachment("front.jpg", "image/jpeg"),
            attachment("back.png", "image/png"),
        ];
        let messages = agent
            .initial_messages("Analyze the given image", &attachments)
            .unwrap();

        let ChatCompletionRequestMessage::User(user) = &messages[1] else {
            panic!("Expected user message");
        };
        let ChatCompletionRequestUserMessageContent::Array(parts) = &user.content else {
            panic!("Expected multi-part content");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(
            parts[0],
            ChatCompletionRequestUserMessageContentPart::Text(_)
        ));
        match &parts[2] {
            ChatCompletionRequestUserMessageContentPart::ImageUrl(image) => {
                assert_eq!(image.image_url.url, "data:image/png;base64,AQID");
            }
            other => panic!("Expected image part, got {:?}", other),
        }
    }

    #[test]
    fn test_initial_messages_reference_uploaded_video() {
        let agent = test_agent(AgentSettings::default().video);
        let video = Attachment {
            file_name: "clip.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            source: MediaSource::Remote("https://files.example/v1beta/files/clip".to_string()),
        };
        let messages = agent.initial_messages("What happens?", &[video]).unwrap();

        let ChatCompletionRequestMessage::User(user) = &messages[1] else {
            panic!("Expected user message");
        };
        let ChatCompletionRequestUserMessageContent::Array(parts) = &user.content else {
            panic!("Expected multi-part content");
        };
        match &parts[1] {
            ChatCompletionRequestUserMessageContentPart::ImageUrl(part) => {
                assert_eq!(part.image_url.url, "https://files.example/v1beta/files/clip");
            }
            other => panic!("Expected media part, got {:?}", other),
        }
    }

    #[test]
    fn test_max_iterations_floor() {
        let agent = test_agent(AgentProfile::default()).with_max_iterations(0);
        assert_eq!(agent.max_iterations, 1);
        assert_eq!(agent.name(), "Agent");
    }
}
