//! Language model access.

mod openai;

pub use openai::OpenAIChatModel;

use crate::config::Settings;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for text completion backends.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a prompt and return the raw text response.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Create the language model described by the settings.
pub fn create_model(settings: &Settings) -> Result<Arc<dyn LanguageModel>> {
    let client = crate::openai::create_client(settings)?;
    Ok(Arc::new(OpenAIChatModel::new(
        client,
        &settings.llm.model,
        settings.llm.temperature,
    )))
}
