//! Substring/token matching, the dependency-free last tier.

use super::{RetrievalStrategy, StrategyKind};
use crate::Result;
use async_trait::async_trait;

/// Always-available strategy with nothing to index.
pub struct KeywordStrategy;

#[async_trait]
impl RetrievalStrategy for KeywordStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Keyword
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn reindex(&mut self, _documents: &[String]) -> Result<()> {
        Ok(())
    }

    async fn rank(&self, query: &str, documents: &[String]) -> Result<Vec<usize>> {
        Ok(rank(query, documents))
    }
}

/// Case-insensitive substring hits in insertion order. With no hit, documents
/// are scored by how many query tokens they contain; zero scores are dropped
/// and equal scores keep insertion order.
pub fn rank(query: &str, documents: &[String]) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let lowered: Vec<String> = documents.iter().map(|d| d.to_lowercase()).collect();

    let hits: Vec<usize> = lowered
        .iter()
        .enumerate()
        .filter(|(_, doc)| doc.contains(&needle))
        .map(|(i, _)| i)
        .collect();

    if !hits.is_empty() {
        return hits;
    }

    let tokens: Vec<&str> = needle.split_whitespace().collect();

    let mut scored: Vec<(usize, usize)> = lowered
        .iter()
        .enumerate()
        .filter_map(|(i, doc)| {
            let score = tokens.iter().filter(|t| doc.contains(**t)).count();
            (score > 0).then_some((i, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(i, _)| i).collect()
}
