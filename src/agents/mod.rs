//! Agent trait and registry
//!
//! An agent turns a free-text query into one structured opinion. New kinds
//! only need to implement `Agent`; the dispatcher and advisor never change.

use crate::generation::Generator;
use crate::models::AgentResponse;
use crate::retrieval::RetrievalEngine;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;

pub mod advisors;

pub use advisors::{
    AdvisorAgent, Persona, ResourceAgent, ACADEMIC_ADVISOR, CAREER_COUNSELOR, SKILLS_ADVISOR,
};

/// Trait for a single advice agent
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Fixed role tag reported in every response.
    fn role(&self) -> &'static str;

    async fn handle(&self, query: &str) -> Result<AgentResponse>;
}

/// Name → agent. Registering an existing name replaces the old agent.
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, agent: Arc<dyn Agent>) {
        self.agents.insert(name.into(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The standard advisor line-up, sharing one retrieval engine and generator.
pub fn create_default_registry(
    retrieval: Arc<RetrievalEngine>,
    generator: Option<Arc<dyn Generator>>,
) -> AgentRegistry {
    let mut registry = AgentRegistry::new();

    for persona in [ACADEMIC_ADVISOR, CAREER_COUNSELOR, SKILLS_ADVISOR] {
        registry.register(
            persona.role,
            Arc::new(AdvisorAgent::new(
                persona,
                retrieval.clone(),
                generator.clone(),
            )),
        );
    }

    registry.register("resource_agent", Arc::new(ResourceAgent::new(retrieval)));

    registry
}
