//! Retrieval-backed advice agents
//!
//! Each advisor looks up supporting documents, asks the generation
//! capability when one is configured, and otherwise (or when generation
//! fails) fills a fixed template from the documents.

use super::Agent;
use crate::generation::Generator;
use crate::models::AgentResponse;
use crate::retrieval::RetrievalEngine;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything that distinguishes one advisor from another.
#[derive(Clone, Copy)]
pub struct Persona {
    pub role: &'static str,
    /// Documents to consult per query.
    pub top_k: usize,
    /// Used when retrieval finds nothing.
    pub default_resources: &'static [&'static str],
    pub system_prompt: &'static str,
    pub prompt: fn(&str, &[String]) -> String,
    pub template: fn(&[String]) -> String,
}

pub const ACADEMIC_ADVISOR: Persona = Persona {
    role: "academic_advisor",
    top_k: 3,
    default_resources: &["Intro to Programming", "Statistics Basics", "Study Plan Guidelines"],
    system_prompt: "You are an academic advisor who plans courses and learning paths for students.",
    prompt: academic_prompt,
    template: academic_template,
};

pub const CAREER_COUNSELOR: Persona = Persona {
    role: "career_counselor",
    top_k: 4,
    default_resources: &["Resume Guide", "Interview Prep", "Portfolio Projects"],
    system_prompt: "You are a career counselor with expertise in job markets and professional development.",
    prompt: career_prompt,
    template: career_template,
};

pub const SKILLS_ADVISOR: Persona = Persona {
    role: "skills_advisor",
    top_k: 3,
    default_resources: &["Python Programming", "SQL Fundamentals", "Communication Skills"],
    system_prompt: "You are a skills development expert who builds practical learning paths.",
    prompt: skills_prompt,
    template: skills_template,
};

fn academic_prompt(query: &str, resources: &[String]) -> String {
    format!(
        "You are an academic advisor. The student asks: {}. Suggest courses and a learning path. Use these resources: {}",
        query,
        resources.join("; ")
    )
}

fn academic_template(resources: &[String]) -> String {
    format!(
        "Suggested courses: {}. Start with fundamentals and projects.",
        resources.join(", ")
    )
}

fn career_prompt(query: &str, resources: &[String]) -> String {
    format!(
        "You are a career counselor. The user asks: {}. Recommend roles, skills, and next steps using resources: {}",
        query,
        resources.join("; ")
    )
}

fn career_template(resources: &[String]) -> String {
    format!(
        "Recommended roles: Data Scientist, ML Engineer. Skills: Python, ML, SQL. Resources: {}",
        resources.join(", ")
    )
}

fn skills_prompt(query: &str, resources: &[String]) -> String {
    format!(
        "The user asks: {}. List the core technical skills, essential soft skills, certifications worth taking and a timeline for acquiring them. Draw on these resources: {}",
        query,
        resources.join("; ")
    )
}

fn skills_template(resources: &[String]) -> String {
    format!(
        "Core skills: Python, SQL, statistics and clear communication. Learning resources: {}. Build one small project per skill and add it to your portfolio.",
        resources.join(", ")
    )
}

/// Advisor driven by a `Persona`.
pub struct AdvisorAgent {
    persona: Persona,
    retrieval: Arc<RetrievalEngine>,
    generator: Option<Arc<dyn Generator>>,
}

impl AdvisorAgent {
    pub fn new(
        persona: Persona,
        retrieval: Arc<RetrievalEngine>,
        generator: Option<Arc<dyn Generator>>,
    ) -> Self {
        Self {
            persona,
            retrieval,
            generator,
        }
    }

    async fn compose(&self, query: &str, resources: &[String]) -> String {
        let Some(generator) = &self.generator else {
            return (self.persona.template)(resources);
        };

        let prompt = (self.persona.prompt)(query, resources);
        match generator
            .generate(&prompt, Some(self.persona.system_prompt))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(agent = self.persona.role, "Generation returned blank text, using template");
                (self.persona.template)(resources)
            }
            Err(e) => {
                warn!(
                    agent = self.persona.role,
                    provider = generator.name(),
                    error = %e,
                    "Generation failed, using template"
                );
                (self.persona.template)(resources)
            }
        }
    }
}

#[async_trait::async_trait]
impl Agent for AdvisorAgent {
    fn role(&self) -> &'static str {
        self.persona.role
    }

    async fn handle(&self, query: &str) -> Result<AgentResponse> {
        let docs = self.retrieval.query(query, self.persona.top_k).await;

        let resources: Vec<String> = if docs.is_empty() {
            self.persona
                .default_resources
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            docs
        };

        debug!(agent = self.persona.role, resources = resources.len(), "Advising");

        let text = self.compose(query, &resources).await;
        Ok(AgentResponse::advice(self.persona.role, text, resources))
    }
}

/// Text shown by the resource agent when nothing matched.
pub const NO_RESOURCES_TEXT: &str = "No matching resources found.";

/// Plain lookup: returns the matching documents themselves.
pub struct ResourceAgent {
    retrieval: Arc<RetrievalEngine>,
    top_k: usize,
}

impl ResourceAgent {
    pub fn new(retrieval: Arc<RetrievalEngine>) -> Self {
        Self { retrieval, top_k: 5 }
    }
}

#[async_trait::async_trait]
impl Agent for ResourceAgent {
    fn role(&self) -> &'static str {
        "resource_agent"
    }

    async fn handle(&self, query: &str) -> Result<AgentResponse> {
        let docs = self.retrieval.query(query, self.top_k).await;

        let text = if docs.is_empty() {
            NO_RESOURCES_TEXT.to_string()
        } else {
            docs.join("\n\n")
        };

        Ok(AgentResponse::advice(self.role(), text, docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::retrieval::{populate_sample_data, KeywordStrategy};
    use std::sync::Mutex;

    struct TimingOut;

    #[async_trait::async_trait]
    impl Generator for TimingOut {
        fn name(&self) -> &'static str {
            "timing-out"
        }

        async fn generate(&self, _prompt: &str, _system: Option<&str>) -> std::result::Result<String, GenerationError> {
            Err(GenerationError::Timeout)
        }
    }

    /// Records the prompt and answers with a canned reply.
    struct Scripted {
        reply: &'static str,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Generator for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn generate(&self, prompt: &str, _system: Option<&str>) -> std::result::Result<String, GenerationError> {
            self.seen.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.to_string())
        }
    }

    async fn sample_engine() -> Arc<RetrievalEngine> {
        let engine = Arc::new(RetrievalEngine::new(Box::new(KeywordStrategy)));
        populate_sample_data(&engine).await;
        engine
    }

    #[tokio::test]
    async fn test_generation_timeout_falls_back_to_template() {
        let agent = AdvisorAgent::new(
            ACADEMIC_ADVISOR,
            sample_engine().await,
            Some(Arc::new(TimingOut)),
        );

        let response = agent.handle("statistics").await.unwrap();
        let text = response.text.clone().unwrap();
        assert_eq!(response.role, "academic_advisor");
        assert!(text.starts_with("Suggested courses: Statistics for Data Science"));
        assert_eq!(response.resources.len(), 1);
    }

    #[tokio::test]
    async fn test_generated_text_is_used() {
        let generator = Arc::new(Scripted {
            reply: "Take linear algebra next.",
            seen: Mutex::new(Vec::new()),
        });
        let agent = AdvisorAgent::new(CAREER_COUNSELOR, sample_engine().await, Some(generator.clone()));

        let response = agent.handle("portfolio").await.unwrap();
        assert_eq!(response.text.as_deref(), Some("Take linear algebra next."));

        let prompts = generator.seen.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("The user asks: portfolio"));
        assert!(prompts[0].contains("Career Tips"));
    }

    #[tokio::test]
    async fn test_blank_generation_uses_template() {
        let generator = Arc::new(Scripted {
            reply: "   ",
            seen: Mutex::new(Vec::new()),
        });
        let agent = AdvisorAgent::new(SKILLS_ADVISOR, sample_engine().await, Some(generator));

        let response = agent.handle("cloud").await.unwrap();
        assert!(response.text.unwrap().starts_with("Core skills:"));
    }

    #[tokio::test]
    async fn test_empty_query_uses_defaults() {
        let agent = AdvisorAgent::new(CAREER_COUNSELOR, sample_engine().await, None);

        let response = agent.handle("").await.unwrap();
        assert_eq!(
            response.resources,
            vec!["Resume Guide", "Interview Prep", "Portfolio Projects"]
        );
        assert!(response.text.unwrap().contains("Resume Guide, Interview Prep"));
    }

    #[tokio::test]
    async fn test_resource_agent_echoes_documents() {
        let agent = ResourceAgent::new(sample_engine().await);

        let response = agent.handle("portfolio").await.unwrap();
        assert_eq!(response.resources.len(), 2);
        assert_eq!(response.text.unwrap(), response.resources.join("\n\n"));

        let empty = agent.handle("").await.unwrap();
        assert!(empty.resources.is_empty());
        assert_eq!(empty.text.as_deref(), Some(NO_RESOURCES_TEXT));
    }
}
