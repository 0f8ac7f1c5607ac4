//! Dense embedding tier.
//!
//! Documents and queries are embedded by a shared provider and compared by
//! cosine similarity.

use super::{rank_by_score, RetrievalStrategy, StrategyKind};
use crate::error::AdvisorError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini accepts at most this many texts per batch request.
const MAX_BATCH: usize = 100;

/// Turns texts into fixed-size vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// One vector per input text, same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

pub struct DenseStrategy {
    provider: Arc<dyn EmbeddingProvider>,
    embeddings: Vec<Vec<f32>>,
}

impl DenseStrategy {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            embeddings: Vec::new(),
        }
    }
}

#[async_trait]
impl RetrievalStrategy for DenseStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dense
    }

    fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    async fn reindex(&mut self, documents: &[String]) -> Result<()> {
        let vectors = self.provider.embed_batch(documents).await?;
        if vectors.len() != documents.len() {
            return Err(AdvisorError::Indexing(format!(
                "{} returned {} embeddings for {} documents",
                self.provider.name(),
                vectors.len(),
                documents.len()
            )));
        }

        debug!(provider = self.provider.name(), count = vectors.len(), "Documents embedded");
        self.embeddings = vectors;
        Ok(())
    }

    async fn rank(&self, query: &str, documents: &[String]) -> Result<Vec<usize>> {
        if self.embeddings.len() != documents.len() {
            return Err(AdvisorError::Retrieval(format!(
                "embedding index covers {} documents, collection has {}",
                self.embeddings.len(),
                documents.len()
            )));
        }

        let query_vector = self
            .provider
            .embed_batch(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AdvisorError::Embedding("no embedding for query".to_string()))?;

        let scores: Vec<f32> = self
            .embeddings
            .iter()
            .map(|doc| cosine_similarity(doc, &query_vector))
            .collect();

        if scores.iter().any(|s| !s.is_finite()) {
            return Err(AdvisorError::Embedding(format!(
                "{} produced non-finite similarity scores",
                self.provider.name()
            )));
        }

        Ok(rank_by_score(&scores))
    }
}

/// Cosine similarity; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + 1e-10)
}

/// Gemini `batchEmbedContents` client. Available whenever a key is set.
pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
        })
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model_path = format!("models/{}", self.model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: &model_path,
                    content: EmbedContent {
                        parts: vec![EmbedPart { text }],
                    },
                })
                .collect(),
        };

        let url = format!(
            "{}/{}:batchEmbedContents?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            error!("Embedding request failed: {}", e);
            AdvisorError::Embedding(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Embedding(format!(
                "embedding API returned {}: {}",
                status, body
            )));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Embedding(format!("invalid embedding response: {}", e)))?;

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn name(&self) -> &str {
        "gemini-embedding"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if !self.is_available() {
            return Err(AdvisorError::Embedding("GEMINI_API_KEY not configured".to_string()));
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            vectors.extend(self.embed_chunk(chunk).await?);
        }
        Ok(vectors)
    }
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: EmbedContent<'a>,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}
