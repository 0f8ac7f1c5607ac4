//! Environment-driven configuration
//!
//! Values come from the process environment; binaries call
//! `dotenv::dotenv()` first so a local `.env` file can supply them.

use crate::error::AdvisorError;
use crate::retrieval::StrategyKind;
use crate::Result;
use std::env;
use std::time::Duration;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_HUGGINGFACE_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 8080;

/// Preferred generation backend. Other backends with keys are tried after
/// it; `None` disables generation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    OpenAi,
    HuggingFace,
    None,
}

/// Requested retrieval tier. `Auto` walks the priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyPreference {
    Auto,
    Forced(StrategyKind),
}

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub llm_provider: LlmProvider,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub huggingface_api_key: String,
    pub huggingface_model: String,
    pub generation_timeout: Duration,
    pub retrieval_strategy: StrategyPreference,
    pub embedding_model: String,
    pub port: u16,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            llm_provider: LlmProvider::None,
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_api_key: String::new(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            huggingface_api_key: String::new(),
            huggingface_model: DEFAULT_HUGGINGFACE_MODEL.to_string(),
            generation_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retrieval_strategy: StrategyPreference::Auto,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl AdvisorConfig {
    /// Load from the current process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let gemini_api_key = get("GEMINI_API_KEY").unwrap_or_default();
        let openai_api_key = get("OPENAI_API_KEY").unwrap_or_default();
        let huggingface_api_key = get("HUGGINGFACE_API_KEY").unwrap_or_default();

        let llm_provider = match get("LLM_PROVIDER") {
            Some(p) => parse_provider(&p)?,
            None if !gemini_api_key.is_empty() => LlmProvider::Gemini,
            None if !openai_api_key.is_empty() => LlmProvider::OpenAi,
            None if !huggingface_api_key.is_empty() => LlmProvider::HuggingFace,
            None => LlmProvider::None,
        };

        let generation_timeout = match get("GENERATION_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                AdvisorError::Config(format!("GENERATION_TIMEOUT_SECS is not a number: {}", raw))
            })?),
            None => defaults.generation_timeout,
        };

        let retrieval_strategy = match get("RETRIEVAL_STRATEGY") {
            Some(raw) => parse_strategy(&raw)?,
            None => StrategyPreference::Auto,
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AdvisorError::Config(format!("invalid port: {}", raw)))?,
            None => defaults.port,
        };

        Ok(Self {
            llm_provider,
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            openai_api_key,
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            huggingface_api_key,
            huggingface_model: get("HUGGINGFACE_MODEL").unwrap_or(defaults.huggingface_model),
            generation_timeout,
            retrieval_strategy,
            embedding_model: get("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            port,
        })
    }
}

fn parse_provider(raw: &str) -> Result<LlmProvider> {
    match raw.trim().to_lowercase().as_str() {
        "gemini" | "google" => Ok(LlmProvider::Gemini),
        "openai" => Ok(LlmProvider::OpenAi),
        "huggingface" | "hf" => Ok(LlmProvider::HuggingFace),
        "none" | "off" | "offline" => Ok(LlmProvider::None),
        other => Err(AdvisorError::Config(format!("unknown LLM_PROVIDER: {}", other))),
    }
}

fn parse_strategy(raw: &str) -> Result<StrategyPreference> {
    match raw.trim().to_lowercase().as_str() {
        "auto" => Ok(StrategyPreference::Auto),
        "dense" | "embedding" => Ok(StrategyPreference::Forced(StrategyKind::Dense)),
        "tfidf" | "tf-idf" | "sparse" => Ok(StrategyPreference::Forced(StrategyKind::Tfidf)),
        "keyword" | "substring" => Ok(StrategyPreference::Forced(StrategyKind::Keyword)),
        other => Err(AdvisorError::Config(format!(
            "unknown RETRIEVAL_STRATEGY: {}",
            other
        ))),
    }
}
