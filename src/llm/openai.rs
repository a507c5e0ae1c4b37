//! Chat completions over an OpenAI-compatible API.

use super::LanguageModel;
use crate::error::{Result, VidQueryError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model reached through async-openai.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| VidQueryError::LanguageModel(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| VidQueryError::LanguageModel(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VidQueryError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| VidQueryError::LanguageModel("Empty response from model".to_string()))?
            .clone();

        debug!("Model returned {} chars", answer.len());
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
