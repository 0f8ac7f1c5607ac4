//! Text generation capability consumed by the advice agents
//!
//! Every backend returns `Result<String, GenerationError>`; callers match on
//! it and fall back to deterministic text.

use crate::config::{AdvisorConfig, LlmProvider};
use crate::error::GenerationError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub mod fallback;
pub mod gemini;
pub mod huggingface;
pub mod openai;

pub use fallback::FallbackGenerator;
pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;
pub use openai::OpenAiClient;

/// System prompt used when the caller does not supply one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful academic and career advisor.";

/// Backends tried after the preferred one.
const CHAIN_ORDER: [LlmProvider; 3] = [
    LlmProvider::Gemini,
    LlmProvider::OpenAi,
    LlmProvider::HuggingFace,
];

/// Given a prompt, return text or fail.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// Build the configured generator, or `None` when agents should stay on
/// their deterministic templates.
///
/// Every backend with a key takes part, the preferred provider first. More
/// than one backend yields a `FallbackGenerator`.
pub fn build_generator(
    config: &AdvisorConfig,
) -> Result<Option<Arc<dyn Generator>>, GenerationError> {
    if config.llm_provider == LlmProvider::None {
        info!("Generation disabled, agents use templates");
        return Ok(None);
    }

    let order = std::iter::once(config.llm_provider)
        .chain(CHAIN_ORDER.into_iter().filter(|p| *p != config.llm_provider));

    let mut backends = Vec::new();
    for provider in order {
        if let Some(backend) = build_backend(provider, config)? {
            backends.push(backend);
        }
    }

    let generator: Option<Arc<dyn Generator>> = match backends.len() {
        0 => None,
        1 => backends.pop(),
        _ => {
            let chain = FallbackGenerator::new(backends);
            info!(providers = ?chain.backend_names(), "Generation fallback chain configured");
            Some(Arc::new(chain))
        }
    };

    match &generator {
        Some(g) => info!(provider = g.name(), "Generation capability configured"),
        None => info!("No generation capability configured, agents use templates"),
    }

    Ok(generator)
}

fn build_backend(
    provider: LlmProvider,
    config: &AdvisorConfig,
) -> Result<Option<Arc<dyn Generator>>, GenerationError> {
    let backend: Arc<dyn Generator> = match provider {
        LlmProvider::Gemini if !config.gemini_api_key.is_empty() => Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            &config.gemini_model,
            config.generation_timeout,
        )?),
        LlmProvider::OpenAi if !config.openai_api_key.is_empty() => Arc::new(OpenAiClient::new(
            config.openai_api_key.clone(),
            &config.openai_model,
            config.generation_timeout,
        )?),
        LlmProvider::HuggingFace if !config.huggingface_api_key.is_empty() => {
            Arc::new(HuggingFaceClient::new(
                config.huggingface_api_key.clone(),
                &config.huggingface_model,
                config.generation_timeout,
            )?)
        }
        _ => return Ok(None),
    };

    Ok(Some(backend))
}
