//! Career Guidance Advisor
//!
//! A multi-agent advisor that:
//! - Ranks an in-memory document collection with tiered retrieval
//!   (dense embeddings, then TF-IDF, then substring/token matching)
//! - Asks several independent advice agents for their opinion
//! - Isolates agent failures per entry instead of aborting the request
//! - Merges the opinions into one answer with deduplicated resources
//!
//! FLOW:
//! QUERY → DISPATCH → AGENTS (RETRIEVE → GENERATE | TEMPLATE) → AGGREGATE

pub mod advisor;
pub mod agents;
pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generation;
pub mod models;
pub mod retrieval;

pub use error::Result;

// Re-export common types
pub use advisor::Advisor;
pub use models::*;
