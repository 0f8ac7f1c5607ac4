//! OpenAI chat completions client

use super::{Generator, DEFAULT_SYSTEM_PROMPT};
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Returned for blank prompts without touching the network.
pub const EMPTY_PROMPT_REPLY: &str = "No prompt provided.";

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
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
            model: model.to_string(),
            endpoint: OPENAI_CHAT_URL.to_string(),
        })
    }

    /// Point the client at an OpenAI-compatible server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(EMPTY_PROMPT_REPLY.to_string());
        }

        if self.api_key.is_empty() {
            return Err(GenerationError::NotConfigured("OPENAI_API_KEY".to_string()));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.unwrap_or(DEFAULT_SYSTEM_PROMPT),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
            max_tokens: 500,
        };

        debug!(model = %self.model, "Calling OpenAI chat completions");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI request failed: {}", e);
                GenerationError::from_transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "OpenAI error response: {}", body);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        extract_answer(completion)
    }
}

fn extract_answer(completion: ChatResponse) -> Result<String, GenerationError> {
    let answer = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    if answer.is_empty() {
        Err(GenerationError::EmptyResponse)
    } else {
        Ok(answer)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: &str) -> OpenAiClient {
        OpenAiClient::new(key.to_string(), "gpt-4o-mini", Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_blank_prompt_short_circuits() {
        let reply = client("").generate("   ", None).await.unwrap();
        assert_eq!(reply, EMPTY_PROMPT_REPLY);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let result = client("").generate("Which degree?", None).await;
        assert!(matches!(result, Err(GenerationError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        let client = client("sk-test").with_endpoint("http://127.0.0.1:1/v1/chat/completions");
        let result = client.generate("Which degree?", None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = client("sk-test")
            .with_endpoint(format!("http://{}/v1/chat/completions", addr));
        let result = client.generate("Which degree?", None).await;

        assert!(matches!(result, Err(GenerationError::Timeout)));
        server.abort();
    }

    #[test]
    fn test_extract_answer() {
        let completion: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":" Consider Data Science. "}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_answer(completion).unwrap(), "Consider Data Science.");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_answer(empty), Err(GenerationError::EmptyResponse)));
    }
}
