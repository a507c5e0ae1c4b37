//! OpenAI-compatible client configuration.

use crate::config::Settings;
use crate::error::{Result, VidQueryError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured OpenAI-compatible API.
///
/// The API key is read from the environment variable named in `llm.api_key_env`,
/// so a missing credential fails here, at startup.
pub fn create_client(settings: &Settings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key()?;
    create_client_with(
        &api_key,
        settings.llm.api_base.as_deref(),
        Duration::from_secs(settings.llm.timeout_seconds),
    )
}

/// Create a client from explicit credentials.
pub fn create_client_with(
    api_key: &str,
    api_base: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VidQueryError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
