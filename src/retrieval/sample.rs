//! Demo resources loaded at startup.

use super::RetrievalEngine;

pub const SAMPLE_DOCUMENTS: [&str; 9] = [
    "Intro to Python: Learn programming basics and data structures.",
    "Statistics for Data Science: Descriptive stats, probability, and inference.",
    "Machine Learning Foundations: Supervised learning, evaluation, and feature engineering.",
    "Deep Learning Specialization: Neural networks, CNNs, RNNs.",
    "Career Tips: How to write a resume, prepare for interviews, and build a portfolio.",
    "Cloud Computing Basics: AWS, Azure, GCP fundamentals and deployment.",
    "Data Engineering: ETL pipelines, databases, and scalable systems.",
    "Research & Publications: How to prepare a research paper and publish findings.",
    "Project-based learning: Build real-world applications and showcase them in a portfolio.",
];

/// Append the demo set. Calling it again appends it again.
pub async fn populate_sample_data(engine: &RetrievalEngine) -> usize {
    engine.add_documents(SAMPLE_DOCUMENTS).await
}
