//! Chat-completion models.

use crate::config::Settings;
use crate::error::{EnkelError, Result};
use crate::openai::{create_client, map_error};
use crate::retry::RetryPolicy;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Who a chat message is from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
}

/// One turn of a chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }
}

/// Token accounting reported by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A model reply. `content` is absent when the model returned no text.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: Option<String>,
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the prompt and return the model's reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion>;
}

/// Chat completions through the OpenAI API.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAIChatModel {
    pub fn with_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.openai)?,
            model: settings.answer.model.clone(),
            temperature: settings.answer.temperature,
            retry: settings.retry_policy(),
        })
    }

    fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let built = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(Into::into),
            Role::Human => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(Into::into),
        };
        built.map_err(|e| EnkelError::InvalidInput(format!("Failed to build chat message: {}", e)))
    }

    async fn complete_once(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<Completion> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| EnkelError::InvalidInput(format!("Failed to build chat request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| map_error("chat", e))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);

        Ok(Completion {
            content,
            model: Some(response.model),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(model = %self.model, turns = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        let request_messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let completion = self
            .retry
            .run("chat completion", move || self.complete_once(request_messages.clone()))
            .await?;

        debug!("Completion usage: {:?}", completion.usage);
        Ok(completion)
    }
}
