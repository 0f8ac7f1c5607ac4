use career_guidance_advisor::{advisor::Advisor, config::AdvisorConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_QUERY: &str = "How do I become a Data Scientist?";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        args.join(" ")
    };

    let config = AdvisorConfig::from_env()?;
    let advisor = Advisor::bootstrap(&config).await?;

    info!(query = %query, "Running advisor");

    let response = advisor.respond(&query).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
