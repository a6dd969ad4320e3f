use finance_query_consensus::{
    api::start_server,
    collaborator::ChatCompletionsClient,
    config::EngineConfig,
    document::FileDocumentSource,
    query::QueryRuntime,
    QueryEngine,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::from_env()?;

    info!("Finance Query Consensus - API Server");
    info!(
        port = config.port,
        trials = config.trial_count,
        document = %config.document_path.display(),
        model = %config.collaborator.model,
        "Configuration loaded"
    );

    // Create components
    let runtime = QueryRuntime::new().into_static();
    let collaborator = Arc::new(ChatCompletionsClient::new(&config.collaborator)?);
    let documents = Arc::new(FileDocumentSource::new(&config.document_path));

    let engine = Arc::new(QueryEngine::new(documents, collaborator, runtime, &config));

    info!("Engine initialized");

    // Start API server
    start_server(engine, config.port).await?;

    Ok(())
}
