//! Text retrieval engine
//!
//! Holds the in-memory document collection and answers "most relevant
//! documents for this query" with the best strategy available when the
//! engine was built:
//!
//! DENSE EMBEDDINGS → TF-IDF → SUBSTRING/TOKEN
//!
//! The substring/token tier doubles as the safety net: whenever the active
//! index is missing or fails, the query is answered from the raw collection.

use crate::config::{AdvisorConfig, StrategyPreference};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub mod dense;
pub mod keyword;
pub mod sample;
pub mod tfidf;

pub use dense::{DenseStrategy, EmbeddingProvider, GeminiEmbedder};
pub use keyword::KeywordStrategy;
pub use sample::{populate_sample_data, SAMPLE_DOCUMENTS};
pub use tfidf::{TfidfStrategy, TfidfVectorizer};

/// Retrieval tiers, in priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Dense,
    Tfidf,
    Keyword,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyKind::Dense => "dense",
            StrategyKind::Tfidf => "tfidf",
            StrategyKind::Keyword => "keyword",
        };
        write!(f, "{}", s)
    }
}

/// One way of ranking the collection against a query.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether the capability behind this strategy can be used at all.
    fn is_available(&self) -> bool;

    /// Rebuild whatever scoring structure the strategy keeps, over the
    /// full collection.
    async fn reindex(&mut self, documents: &[String]) -> Result<()>;

    /// Indices into `documents`, best first.
    async fn rank(&self, query: &str, documents: &[String]) -> Result<Vec<usize>>;
}

struct EngineState {
    documents: Vec<String>,
    strategy: Box<dyn RetrievalStrategy>,
    /// False after a failed reindex until the next successful one.
    index_ready: bool,
}

/// In-memory document collection plus its active ranking strategy.
///
/// `add_documents` takes the write lock, `query` the read lock.
pub struct RetrievalEngine {
    kind: StrategyKind,
    state: RwLock<EngineState>,
}

impl RetrievalEngine {
    /// Use exactly this strategy (tests inject one here).
    pub fn new(strategy: Box<dyn RetrievalStrategy>) -> Self {
        let kind = strategy.kind();
        info!(strategy = %kind, "Retrieval strategy selected");

        Self {
            kind,
            state: RwLock::new(EngineState {
                documents: Vec::new(),
                strategy,
                index_ready: true,
            }),
        }
    }

    /// First available candidate wins; the keyword tier if none is.
    pub fn select(candidates: Vec<Box<dyn RetrievalStrategy>>) -> Self {
        let chosen = candidates.into_iter().find(|c| {
            let available = c.is_available();
            if !available {
                debug!(strategy = %c.kind(), "Retrieval strategy unavailable");
            }
            available
        });

        Self::new(chosen.unwrap_or_else(|| Box::new(KeywordStrategy)))
    }

    /// Build the standard candidate chain and pick according to config.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let embedder = GeminiEmbedder::new(
            config.gemini_api_key.clone(),
            &config.embedding_model,
            config.generation_timeout,
        )?;

        let mut candidates: Vec<Box<dyn RetrievalStrategy>> = vec![
            Box::new(DenseStrategy::new(Arc::new(embedder))),
            Box::new(TfidfStrategy::new()),
            Box::new(KeywordStrategy),
        ];

        if let StrategyPreference::Forced(kind) = config.retrieval_strategy {
            match candidates
                .iter()
                .position(|c| c.kind() == kind && c.is_available())
            {
                Some(pos) => return Ok(Self::new(candidates.swap_remove(pos))),
                None => warn!(
                    strategy = %kind,
                    "Forced retrieval strategy unavailable, using priority order"
                ),
            }
        }

        Ok(Self::select(candidates))
    }

    /// The strategy chosen at construction.
    pub fn strategy(&self) -> StrategyKind {
        self.kind
    }

    /// Append non-empty documents and reindex.
    ///
    /// Documents stay appended even when reindexing fails; queries then run
    /// on the keyword tier until a later reindex succeeds. Returns the number
    /// of documents appended.
    pub async fn add_documents<I, S>(&self, docs: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let new_docs: Vec<String> = docs
            .into_iter()
            .map(Into::into)
            .filter(|d| !d.is_empty())
            .collect();

        if new_docs.is_empty() {
            return 0;
        }

        let added = new_docs.len();
        let mut state = self.state.write().await;
        state.documents.extend(new_docs);

        let EngineState {
            documents,
            strategy,
            index_ready,
        } = &mut *state;

        match strategy.reindex(documents).await {
            Ok(()) => {
                *index_ready = true;
                debug!(
                    strategy = %self.kind,
                    total = documents.len(),
                    added,
                    "Collection reindexed"
                );
            }
            Err(e) => {
                *index_ready = false;
                warn!(
                    strategy = %self.kind,
                    error = %e,
                    "Reindex failed, queries fall back to keyword matching"
                );
            }
        }

        added
    }

    /// Up to `top_k` documents, best first. Blank queries return nothing.
    pub async fn query(&self, text: &str, top_k: usize) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let state = self.state.read().await;
        if state.documents.is_empty() {
            return Vec::new();
        }

        let ranked = if state.index_ready {
            match state.strategy.rank(text, &state.documents).await {
                Ok(ranked) => ranked,
                Err(e) => {
                    warn!(
                        strategy = %self.kind,
                        error = %e,
                        "Ranking failed, falling back to keyword matching"
                    );
                    keyword::rank(text, &state.documents)
                }
            }
        } else {
            debug!(strategy = %self.kind, "Index not ready, using keyword matching");
            keyword::rank(text, &state.documents)
        };

        let results: Vec<String> = ranked
            .into_iter()
            .filter(|&i| i < state.documents.len())
            .take(top_k)
            .map(|i| state.documents[i].clone())
            .collect();

        debug!(
            strategy = %self.kind,
            top_k,
            returned = results.len(),
            "Query answered"
        );

        results
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the collection in insertion order.
    pub async fn documents(&self) -> Vec<String> {
        self.state.read().await.documents.clone()
    }

    /// True while the active index is out of date after a failed reindex.
    pub async fn is_degraded(&self) -> bool {
        !self.state.read().await.index_ready
    }
}

/// Indices sorted by descending score; ties keep insertion order and NaN
/// scores sort last.
pub(crate) fn rank_by_score(scores: &[f32]) -> Vec<usize> {
    let key = |i: usize| {
        let score = scores[i];
        if score.is_nan() {
            f32::NEG_INFINITY
        } else {
            score
        }
    };

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| key(b).total_cmp(&key(a)));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdvisorConfig;
    use tokio_test::assert_ok;

    fn keyword_engine() -> RetrievalEngine {
        RetrievalEngine::new(Box::new(KeywordStrategy))
    }

    struct UnavailableStrategy;

    #[async_trait]
    impl RetrievalStrategy for UnavailableStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::Dense
        }

        fn is_available(&self) -> bool {
            false
        }

        async fn reindex(&mut self, _documents: &[String]) -> Result<()> {
            Ok(())
        }

        async fn rank(&self, _query: &str, _documents: &[String]) -> Result<Vec<usize>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_rank_by_score_is_stable() {
        let order = rank_by_score(&[0.1, 0.5, 0.1, 0.5, 0.0]);
        assert_eq!(order, vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_rank_by_score_tolerates_nan() {
        let scores: Vec<f32> = (0..64)
            .map(|i| if i % 5 == 0 { f32::NAN } else { (i % 7) as f32 / 7.0 })
            .collect();

        let order = rank_by_score(&scores);

        assert_eq!(order.len(), scores.len());
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..64).collect::<Vec<_>>());

        let nan_count = scores.iter().filter(|s| s.is_nan()).count();
        let (ranked, tail) = order.split_at(order.len() - nan_count);
        assert!(tail.iter().all(|&i| scores[i].is_nan()));
        assert!(ranked.windows(2).all(|w| scores[w[0]] >= scores[w[1]]));
    }

    #[test]
    fn test_select_skips_unavailable() {
        let engine = RetrievalEngine::select(vec![
            Box::new(UnavailableStrategy),
            Box::new(TfidfStrategy::new()),
            Box::new(KeywordStrategy),
        ]);
        assert_eq!(engine.strategy(), StrategyKind::Tfidf);

        let engine = RetrievalEngine::select(vec![Box::new(UnavailableStrategy)]);
        assert_eq!(engine.strategy(), StrategyKind::Keyword);
    }

    #[test]
    fn test_from_config_without_embedding_key() {
        let engine = assert_ok!(RetrievalEngine::from_config(&AdvisorConfig::default()));
        assert_eq!(engine.strategy(), StrategyKind::Tfidf);

        let forced_dense = AdvisorConfig {
            retrieval_strategy: StrategyPreference::Forced(StrategyKind::Dense),
            ..AdvisorConfig::default()
        };
        let engine = assert_ok!(RetrievalEngine::from_config(&forced_dense));
        assert_eq!(engine.strategy(), StrategyKind::Tfidf);

        let forced_keyword = AdvisorConfig {
            retrieval_strategy: StrategyPreference::Forced(StrategyKind::Keyword),
            ..AdvisorConfig::default()
        };
        let engine = assert_ok!(RetrievalEngine::from_config(&forced_keyword));
        assert_eq!(engine.strategy(), StrategyKind::Keyword);
    }

    #[test]
    fn test_from_config_with_embedding_key_prefers_dense() {
        let config = AdvisorConfig {
            gemini_api_key: "test-key".to_string(),
            ..AdvisorConfig::default()
        };
        let engine = assert_ok!(RetrievalEngine::from_config(&config));
        assert_eq!(engine.strategy(), StrategyKind::Dense);
    }

    #[tokio::test]
    async fn test_blank_query_returns_nothing() {
        let engine = keyword_engine();
        populate_sample_data(&engine).await;

        for k in [0, 1, 5, 100] {
            assert!(engine.query("", k).await.is_empty());
            assert!(engine.query("   \t", k).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_collection_returns_nothing() {
        for engine in [keyword_engine(), RetrievalEngine::new(Box::new(TfidfStrategy::new()))] {
            assert!(engine.query("statistics", 5).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_results_bounded_by_top_k() {
        let engine = RetrievalEngine::new(Box::new(TfidfStrategy::new()));
        populate_sample_data(&engine).await;

        for k in 0..12 {
            let results = engine.query("learning data portfolio", k).await;
            assert!(results.len() <= k);
        }
        assert_eq!(engine.query("learning", 0).await.len(), 0);
    }

    #[tokio::test]
    async fn test_sequential_adds_keep_call_order() {
        let engine = keyword_engine();
        engine.add_documents(["Rust Systems Programming", "Kubernetes Operations"]).await;
        engine.add_documents(vec!["UX Research Methods".to_string()]).await;

        assert_eq!(
            engine.documents().await,
            vec![
                "Rust Systems Programming",
                "Kubernetes Operations",
                "UX Research Methods",
            ]
        );
        assert_eq!(engine.query("kubernetes", 3).await, vec!["Kubernetes Operations"]);
        assert_eq!(engine.query("ux research", 3).await, vec!["UX Research Methods"]);
    }

    #[tokio::test]
    async fn test_empty_documents_are_dropped() {
        let engine = keyword_engine();
        let added = engine.add_documents(["", "Data Engineering", ""]).await;
        assert_eq!(added, 1);
        assert_eq!(engine.len().await, 1);
        assert_eq!(engine.add_documents(Vec::<String>::new()).await, 0);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept_and_returned() {
        let engine = keyword_engine();
        engine.add_documents(["Career Tips", "Career Tips"]).await;
        assert_eq!(engine.query("career", 5).await, vec!["Career Tips", "Career Tips"]);
    }

    #[tokio::test]
    async fn test_repopulating_readds_samples() {
        let engine = keyword_engine();
        populate_sample_data(&engine).await;
        populate_sample_data(&engine).await;
        assert_eq!(engine.len().await, SAMPLE_DOCUMENTS.len() * 2);
    }

    #[tokio::test]
    async fn test_failed_index_falls_back_to_keywords() {
        let engine = RetrievalEngine::new(Box::new(TfidfStrategy::new()));
        // nothing but stop words: the vectorizer has no vocabulary
        engine.add_documents(["the and of", "it is a"]).await;

        assert!(engine.is_degraded().await);
        assert_eq!(engine.len().await, 2);
        assert_eq!(engine.query("and", 5).await, vec!["the and of"]);

        engine.add_documents(["Cloud Computing Basics"]).await;
        assert!(!engine.is_degraded().await);
        assert_eq!(engine.query("cloud", 1).await, vec!["Cloud Computing Basics"]);
    }

    #[tokio::test]
    async fn test_repeated_query_is_deterministic() {
        let engine = keyword_engine();
        populate_sample_data(&engine).await;

        let first = engine.query("data portfolio learning", 5).await;
        for _ in 0..5 {
            assert_eq!(engine.query("data portfolio learning", 5).await, first);
        }
    }
}
