//! Hugging Face Inference API client

use super::Generator;
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const HF_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";

/// New tokens requested per call.
const MAX_NEW_TOKENS: u32 = 150;

pub struct HuggingFaceClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl HuggingFaceClient {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/{}", HF_INFERENCE_URL, model),
        })
    }

    /// Point the client at a self-hosted inference server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Generator for HuggingFaceClient {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::NotConfigured("HUGGINGFACE_API_KEY".to_string()));
        }

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        // text-generation models take a single input string
        let inputs = match system {
            Some(system) => format!("{}\n\n{}", system, prompt),
            None => prompt.to_string(),
        };

        let request = InferenceRequest {
            inputs: &inputs,
            parameters: Parameters {
                max_new_tokens: MAX_NEW_TOKENS,
            },
            options: Options {
                use_cache: false,
                wait_for_model: true,
            },
        };

        debug!(endpoint = %self.endpoint, "Calling Hugging Face inference");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Hugging Face request failed: {}", e);
                GenerationError::from_transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Hugging Face error response: {}", body);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let output: InferenceResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        extract_answer(output)
    }
}

fn extract_answer(output: InferenceResponse) -> Result<String, GenerationError> {
    let generated = match output {
        InferenceResponse::Many(items) => items.into_iter().next().and_then(|g| g.generated_text),
        InferenceResponse::One(item) => item.generated_text,
    };

    let answer = generated.map(|t| t.trim().to_string()).unwrap_or_default();
    if answer.is_empty() {
        Err(GenerationError::EmptyResponse)
    } else {
        Ok(answer)
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Parameters {
    max_new_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Options {
    use_cache: bool,
    wait_for_model: bool,
}

/// The endpoint answers with a list or a bare object depending on the model.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    #[serde(default)]
    generated_text: Option<String>,
}
