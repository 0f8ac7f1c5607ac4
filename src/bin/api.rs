use career_guidance_advisor::{advisor::Advisor, api::start_server, config::AdvisorConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AdvisorConfig::from_env()?;

    info!("Career Guidance Advisor - API Server");
    info!(port = config.port, provider = ?config.llm_provider, "Configuration loaded");

    let advisor = Arc::new(Advisor::bootstrap(&config).await?);

    info!("Starting API server...");
    start_server(advisor, config.port).await?;

    Ok(())
}
