//! # AI Provider Factory
//!
//! Builds the configured `AiProvider` so that the CLI and the tests construct
//! backends the same way.

use crate::{
    config::{ProviderConfig, ProviderKind},
    errors::ConfigError,
    providers::ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider},
};
use std::sync::Arc;
use tracing::info;

const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Creates an AI provider instance from the provider section of the configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn AiProvider>, ConfigError> {
    info!(provider = ?config.kind, model = %config.model_name, "Configuring AI provider");

    let provider: Arc<dyn AiProvider> = match config.kind {
        ProviderKind::Gemini => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                ConfigError::MissingProvider(
                    "AI_API_KEY must be set to use Gemini models.".to_string(),
                )
            })?;
            let api_url = config
                .api_url
                .clone()
                .unwrap_or_else(|| GeminiProvider::endpoint_for(&config.model_name));
            Arc::new(
                GeminiProvider::new(api_url, api_key)
                    .map_err(|e| ConfigError::General(e.to_string()))?,
            )
        }
        ProviderKind::Openai => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                ConfigError::MissingProvider(
                    "AI_API_KEY must be set to use OpenAI models.".to_string(),
                )
            })?;
            let api_url = config
                .api_url
                .clone()
                .unwrap_or_else(|| OPENAI_CHAT_COMPLETIONS_URL.to_string());
            Arc::new(
                LocalAiProvider::new(api_url, Some(api_key), Some(config.model_name.clone()))
                    .map_err(|e| ConfigError::General(e.to_string()))?,
            )
        }
        ProviderKind::Local => {
            let api_url = config.api_url.clone().ok_or_else(|| {
                ConfigError::MissingProvider(
                    "provider.api_url must be set for the local provider.".to_string(),
                )
            })?;
            Arc::new(
                LocalAiProvider::new(
                    api_url,
                    config.api_key.clone(),
                    Some(config.model_name.clone()),
                )
                .map_err(|e| ConfigError::General(e.to_string()))?,
            )
        }
    };

    Ok(provider)
}
