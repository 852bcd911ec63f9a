pub mod factory;
pub mod gemini;
pub mod local;

use crate::errors::ModelError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;
use std::time::Duration;

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: 2000,
        }
    }
}

/// A trait for interacting with an AI provider.
///
/// Every pipeline stage talks to the language model through this interface, so
/// any backend (Gemini, an OpenAI-compatible endpoint, a test double) can be
/// injected at construction time.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a completion for the given system and user prompt.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ModelError>;
}

dyn_clone::clone_trait_object!(AiProvider);

/// Runs a generation call under a deadline, mapping expiry to `ModelError::Timeout`.
pub async fn generate_with_timeout(
    provider: &dyn AiProvider,
    system_prompt: &str,
    user_prompt: &str,
    params: &GenerationParams,
    timeout: Duration,
) -> Result<String, ModelError> {
    match tokio::time::timeout(timeout, provider.generate(system_prompt, user_prompt, params)).await
    {
        Ok(result) => result,
        Err(_) => Err(ModelError::Timeout(timeout)),
    }
}
