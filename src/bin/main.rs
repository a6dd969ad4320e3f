use finance_query_consensus::{
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
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: finance-query <question>");
        std::process::exit(2);
    }

    let config = EngineConfig::from_env()?;

    let engine = QueryEngine::new(
        Arc::new(FileDocumentSource::new(&config.document_path)),
        Arc::new(ChatCompletionsClient::new(&config.collaborator)?),
        QueryRuntime::new().into_static(),
        &config,
    );

    info!(question = %question, "Asking");

    let consensus = engine.answer(&question).await?;

    eprintln!("{}", consensus);
    println!("{}", serde_json::to_string_pretty(&consensus)?);

    Ok(())
}
