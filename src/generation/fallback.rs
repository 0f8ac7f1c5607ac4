//! Ordered chain of generation backends

use super::Generator;
use crate::error::GenerationError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tries each backend in order and returns the first non-blank answer.
pub struct FallbackGenerator {
    backends: Vec<Arc<dyn Generator>>,
}

impl FallbackGenerator {
    pub fn new(backends: Vec<Arc<dyn Generator>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}

#[async_trait]
impl Generator for FallbackGenerator {
    fn name(&self) -> &'static str {
        "fallback"
    }

    /// Returns the last backend's error when every backend fails.
    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, GenerationError> {
        let mut last_error = None;

        for backend in &self.backends {
            match backend.generate(prompt, system).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(provider = backend.name(), "Generation succeeded");
                    return Ok(text);
                }
                Ok(_) => {
                    warn!(provider = backend.name(), "Blank generation, trying next backend");
                    last_error = Some(GenerationError::EmptyResponse);
                }
                Err(e) => {
                    warn!(provider = backend.name(), error = %e, "Generation failed, trying next backend");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GenerationError::NotConfigured("generation backend".to_string())))
    }
}
