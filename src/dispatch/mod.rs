//! Dispatcher: fans one query out to registered agents
//!
//! Agents run one after another. Every failure stays inside its own entry
//! of the result map; a missing, failing or panicking agent never stops
//! the others.

use crate::agents::{Agent, AgentRegistry};
use crate::models::{AgentOutcome, DispatchResults};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;
use tracing::{debug, warn};

pub struct Dispatcher {
    registry: AgentRegistry,
}

impl Dispatcher {
    pub fn new(registry: AgentRegistry) -> Self {
        Self { registry }
    }

    /// Store or replace the agent under `name`.
    pub fn register(&mut self, name: impl Into<String>, agent: Arc<dyn Agent>) {
        self.registry.register(name, agent);
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Run `query` through the named agents, or through all of them when
    /// `names` is `None` or empty. One entry per distinct requested name.
    pub async fn dispatch(&self, query: &str, names: Option<&[String]>) -> DispatchResults {
        let targets: Vec<String> = match names {
            Some(names) if !names.is_empty() => names.to_vec(),
            _ => self.registry.names(),
        };

        let mut results = DispatchResults::new();

        for name in targets {
            if results.contains_key(&name) {
                continue;
            }

            let outcome = match self.registry.get(&name) {
                Some(agent) => self.run_agent(&name, agent, query).await,
                None => {
                    warn!(agent = %name, "Agent not registered");
                    AgentOutcome::not_found()
                }
            };

            results.insert(name, outcome);
        }

        debug!(
            agents = results.len(),
            succeeded = results.values().filter(|o| o.is_success()).count(),
            "Dispatch completed"
        );

        results
    }

    async fn run_agent(&self, name: &str, agent: Arc<dyn Agent>, query: &str) -> AgentOutcome {
        let start = Instant::now();
        let owned_query = query.to_string();

        // own task so a panic comes back as a JoinError
        let handle = tokio::spawn(async move { agent.handle(&owned_query).await });

        let outcome = match handle.await {
            Ok(Ok(response)) => AgentOutcome::Completed(response),
            Ok(Err(e)) => {
                warn!(agent = %name, error = %e, "Agent execution failed");
                AgentOutcome::failed(e.to_string())
            }
            Err(join_error) => {
                let message = describe_join_error(join_error);
                warn!(agent = %name, error = %message, "Agent task aborted");
                AgentOutcome::failed(message)
            }
        };

        debug!(
            agent = %name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            success = outcome.is_success(),
            "Agent finished"
        );

        outcome
    }
}

fn describe_join_error(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }

    let payload = error.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("agent panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("agent panicked: {}", s)
    } else {
        "agent panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisorError;
    use crate::models::{AgentResponse, AGENT_NOT_FOUND};
    use crate::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        role: &'static str,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(role: &'static str) -> Arc<Self> {
            Arc::new(Self {
                role,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl Agent for Fixed {
        fn role(&self) -> &'static str {
            self.role
        }

        async fn handle(&self, query: &str) -> Result<AgentResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AgentResponse::advice(
                self.role,
                format!("{} says: {}", self.role, query),
                vec![format!("{} guide", self.role)],
            ))
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl Agent for Failing {
        fn role(&self) -> &'static str {
            "failing"
        }

        async fn handle(&self, _query: &str) -> Result<AgentResponse> {
            Err(AdvisorError::AgentExecution("quota exhausted".to_string()))
        }
    }

    struct Panicking;

    #[async_trait::async_trait]
    impl Agent for Panicking {
        fn role(&self) -> &'static str {
            "panicking"
        }

        async fn handle(&self, _query: &str) -> Result<AgentResponse> {
            panic!("index out of range");
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut dispatcher = Dispatcher::new(AgentRegistry::new());
        dispatcher.register("alpha", Fixed::new("alpha"));
        dispatcher.register("beta", Fixed::new("beta"));
        dispatcher
    }

    #[tokio::test]
    async fn test_dispatch_all_when_no_names() {
        let dispatcher = dispatcher();

        let results = dispatcher.dispatch("hello", None).await;
        assert_eq!(results.len(), 2);
        assert!(results.values().all(|o| o.is_success()));

        let empty: Vec<String> = Vec::new();
        let results = dispatcher.dispatch("hello", Some(empty.as_slice())).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_agent_reported_per_entry() {
        let dispatcher = dispatcher();
        let names = vec!["alpha".to_string(), "ghost".to_string()];

        let results = dispatcher.dispatch("hello", Some(names.as_slice())).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results["ghost"].error(), Some(AGENT_NOT_FOUND));
        assert!(results["alpha"].is_success());
        assert!(!results.contains_key("beta"));
    }

    #[tokio::test]
    async fn test_failures_do_not_affect_siblings() {
        let mut dispatcher = dispatcher();
        dispatcher.register("failing", Arc::new(Failing));
        dispatcher.register("panicking", Arc::new(Panicking));

        let results = dispatcher.dispatch("hello", None).await;
        assert_eq!(results.len(), 4);

        let failing = results["failing"].error().unwrap();
        assert!(failing.contains("quota exhausted"));

        let panicking = results["panicking"].error().unwrap();
        assert!(panicking.contains("index out of range"));

        let alpha = results["alpha"].response().unwrap();
        assert_eq!(alpha.text.as_deref(), Some("alpha says: hello"));
        assert!(results["beta"].is_success());
    }

    #[tokio::test]
    async fn test_duplicate_names_run_once() {
        let mut dispatcher = Dispatcher::new(AgentRegistry::new());
        let alpha = Fixed::new("alpha");
        dispatcher.register("alpha", alpha.clone());

        let names = vec!["alpha".to_string(), "alpha".to_string()];
        let results = dispatcher.dispatch("hi", Some(names.as_slice())).await;

        assert_eq!(results.len(), 1);
        assert_eq!(alpha.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reregistration_replaces_agent() {
        let mut dispatcher = dispatcher();
        dispatcher.register("alpha", Arc::new(Failing));

        let results = dispatcher.dispatch("hello", None).await;
        assert_eq!(dispatcher.agent_names(), vec!["alpha", "beta"]);
        assert!(results["alpha"].error().is_some());
    }
}
