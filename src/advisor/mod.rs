//! Advisor - the caller-facing entry point
//!
//! QUERY → DISPATCH (all agents) → AGGREGATE → RESPONSE
//!
//! Aggregation never fails: agent errors stay in `agent_results` and simply
//! contribute no text and no resources.

use crate::agents::create_default_registry;
use crate::config::AdvisorConfig;
use crate::dispatch::Dispatcher;
use crate::generation::build_generator;
use crate::models::{AggregatedResponse, DispatchResults};
use crate::retrieval::{populate_sample_data, KeywordStrategy, RetrievalEngine};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Upper bound on merged resources in one response.
pub const MAX_RESOURCES: usize = 20;

pub struct Advisor {
    dispatcher: Dispatcher,
    retrieval: Arc<RetrievalEngine>,
}

impl Advisor {
    /// Wrap a custom dispatcher. The advisor gets its own empty engine; use
    /// `with_retrieval` to share the one the agents query.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            retrieval: Arc::new(RetrievalEngine::new(Box::new(KeywordStrategy))),
        }
    }

    pub fn with_retrieval(mut self, retrieval: Arc<RetrievalEngine>) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Full wiring from configuration: generator, retrieval tier, sample
    /// documents, default agents.
    pub async fn bootstrap(config: &AdvisorConfig) -> Result<Self> {
        let generator = build_generator(config)?;

        let retrieval = Arc::new(RetrievalEngine::from_config(config)?);
        let loaded = populate_sample_data(&retrieval).await;
        info!(
            strategy = %retrieval.strategy(),
            documents = loaded,
            "Retrieval engine ready"
        );

        let registry = create_default_registry(retrieval.clone(), generator);
        let dispatcher = Dispatcher::new(registry);
        info!(agents = ?dispatcher.agent_names(), "Advisor initialized");

        Ok(Self::new(dispatcher).with_retrieval(retrieval))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn retrieval(&self) -> &Arc<RetrievalEngine> {
        &self.retrieval
    }

    /// Ask every registered agent and merge what they said.
    pub async fn respond(&self, query: &str) -> AggregatedResponse {
        let start = Instant::now();
        info!(query = %query, "Responding");

        let results = self.dispatcher.dispatch(query, None).await;
        let response = aggregate(results);

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            resources = response.resources.len(),
            "Response aggregated"
        );

        response
    }
}

/// Merge raw dispatch results into one answer.
///
/// Each successful agent with content contributes a `[name] content`
/// paragraph. Resources of every successful agent are merged, deduplicated
/// in first-seen order and capped at `MAX_RESOURCES`.
pub fn aggregate(results: DispatchResults) -> AggregatedResponse {
    let mut paragraphs = Vec::new();
    let mut resources: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (name, outcome) in &results {
        let Some(response) = outcome.response() else {
            continue;
        };

        if let Some(content) = response.content() {
            paragraphs.push(format!("[{}] {}", name, content));
        }

        for resource in &response.resources {
            if seen.insert(resource.clone()) {
                resources.push(resource.clone());
            }
        }
    }

    resources.truncate(MAX_RESOURCES);

    AggregatedResponse {
        combined_text: paragraphs.join("\n\n"),
        resources,
        agent_results: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{
        Agent, AgentRegistry, AdvisorAgent, ACADEMIC_ADVISOR, CAREER_COUNSELOR,
    };
    use crate::error::AdvisorError;
    use crate::models::{AgentOutcome, AgentResponse};

    async fn sample_engine() -> Arc<RetrievalEngine> {
        let engine = Arc::new(RetrievalEngine::new(Box::new(KeywordStrategy)));
        populate_sample_data(&engine).await;
        engine
    }

    struct ResourcesOnly;

    #[async_trait::async_trait]
    impl Agent for ResourcesOnly {
        fn role(&self) -> &'static str {
            "librarian"
        }

        async fn handle(&self, _query: &str) -> Result<AgentResponse> {
            Ok(AgentResponse {
                role: "librarian".to_string(),
                text: None,
                response: None,
                resources: vec!["Reading List".to_string()],
            })
        }
    }

    struct Broken;

    #[async_trait::async_trait]
    impl Agent for Broken {
        fn role(&self) -> &'static str {
            "broken"
        }

        async fn handle(&self, _query: &str) -> Result<AgentResponse> {
            Err(AdvisorError::AgentExecution("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_two_advisors_scenario() {
        let engine = sample_engine().await;
        let mut registry = AgentRegistry::new();
        registry.register(
            "academic_advisor",
            Arc::new(AdvisorAgent::new(ACADEMIC_ADVISOR, engine.clone(), None)),
        );
        registry.register(
            "career_counselor",
            Arc::new(AdvisorAgent::new(CAREER_COUNSELOR, engine.clone(), None)),
        );
        let advisor = Advisor::new(Dispatcher::new(registry)).with_retrieval(engine);

        let response = advisor.respond("How do I become a Data Scientist?").await;

        assert!(response.combined_text.contains("[academic_advisor]"));
        assert!(response.combined_text.contains("[career_counselor]"));
        assert!(!response.resources.is_empty());
        assert_eq!(response.agent_results.len(), 2);
    }

    #[test]
    fn test_resources_deduplicated_and_capped() {
        let mut results = DispatchResults::new();
        let shared: Vec<String> = (0..15).map(|i| format!("doc {}", i)).collect();
        let extra: Vec<String> = (10..30).map(|i| format!("doc {}", i)).collect();

        results.insert(
            "a".to_string(),
            AgentOutcome::Completed(AgentResponse::advice("a", "first", shared)),
        );
        results.insert(
            "b".to_string(),
            AgentOutcome::Completed(AgentResponse::advice("b", "second", extra)),
        );

        let response = aggregate(results);
        let expected: Vec<String> = (0..20).map(|i| format!("doc {}", i)).collect();
        assert_eq!(response.resources, expected);
        assert_eq!(response.combined_text, "[a] first\n\n[b] second");
    }

    #[tokio::test]
    async fn test_all_agents_failing_yields_empty_answer() {
        let mut registry = AgentRegistry::new();
        registry.register("broken", Arc::new(Broken));
        registry.register("also_broken", Arc::new(Broken));
        let advisor = Advisor::new(Dispatcher::new(registry));

        let response = advisor.respond("anything").await;

        assert_eq!(response.combined_text, "");
        assert!(response.resources.is_empty());
        assert_eq!(response.agent_results.len(), 2);
        assert!(response.agent_results.values().all(|o| !o.is_success()));
    }

    #[tokio::test]
    async fn test_resources_merged_without_text() {
        let mut registry = AgentRegistry::new();
        registry.register("librarian", Arc::new(ResourcesOnly));
        registry.register("broken", Arc::new(Broken));
        let advisor = Advisor::new(Dispatcher::new(registry));

        let response = advisor.respond("books").await;

        assert_eq!(response.combined_text, "");
        assert_eq!(response.resources, vec!["Reading List"]);
    }

    #[test]
    fn test_bare_response_used_when_text_missing() {
        let mut results = DispatchResults::new();
        results.insert(
            "echo".to_string(),
            AgentOutcome::Completed(AgentResponse::bare("echo", "hello there")),
        );

        let response = aggregate(results);
        assert_eq!(response.combined_text, "[echo] hello there");
    }

    #[tokio::test]
    async fn test_bootstrap_without_credentials() {
        let config = AdvisorConfig::default();
        let advisor = Advisor::bootstrap(&config).await.unwrap();

        assert_eq!(advisor.retrieval().len().await, 9);
        assert_eq!(advisor.dispatcher().agent_names().len(), 4);

        let response = advisor.respond("statistics").await;
        assert_eq!(response.agent_results.len(), 4);
        assert!(response
            .resources
            .iter()
            .any(|r| r.contains("Statistics for Data Science")));
    }
}
