//! Core data models for the advisor

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error string reported for a dispatch to a name nobody registered.
pub const AGENT_NOT_FOUND: &str = "agent_not_found";

//
// ================= Agent Response =================
//

/// One agent's opinion for a query.
///
/// `text` is the normal advice field. `response` carries free text from
/// agents that produce a bare answer rather than structured advice; when both
/// are set, `text` wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResponse {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}

impl AgentResponse {
    /// Structured advice with the resources that backed it.
    pub fn advice(role: impl Into<String>, text: impl Into<String>, resources: Vec<String>) -> Self {
        Self {
            role: role.into(),
            text: Some(text.into()),
            response: None,
            resources,
        }
    }

    /// A bare answer without structured advice text.
    pub fn bare(role: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: None,
            response: Some(response.into()),
            resources: Vec::new(),
        }
    }

    /// The authoritative content, `text` first, then `response`.
    pub fn content(&self) -> Option<&str> {
        self.text.as_deref().or(self.response.as_deref())
    }
}

//
// ================= Dispatch Outcome =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentFailure {
    pub error: String,
}

/// Raw per-agent result of a dispatch. Serialises to either the response
/// object or `{"error": "..."}`, never both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AgentOutcome {
    Failed(AgentFailure),
    Completed(AgentResponse),
}

impl AgentOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        AgentOutcome::Failed(AgentFailure {
            error: error.into(),
        })
    }

    pub fn not_found() -> Self {
        Self::failed(AGENT_NOT_FOUND)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentOutcome::Completed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AgentOutcome::Failed(f) => Some(&f.error),
            AgentOutcome::Completed(_) => None,
        }
    }

    pub fn response(&self) -> Option<&AgentResponse> {
        match self {
            AgentOutcome::Completed(r) => Some(r),
            AgentOutcome::Failed(_) => None,
        }
    }
}

/// Agent name → raw outcome, one entry per requested name.
pub type DispatchResults = BTreeMap<String, AgentOutcome>;

//
// ================= Aggregated Response =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedResponse {
    pub combined_text: String,
    pub resources: Vec<String>,
    pub agent_results: DispatchResults,
}
