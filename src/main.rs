use std::sync::Arc;

use anyhow::Context;
use inbox_digest::auth::AccessCredentials;
use inbox_digest::config::AppConfig;
use inbox_digest::enrich::{AssistantTransport, Enricher, GenerationTransport};
use inbox_digest::mail::{GmailTransport, fetch_unread};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;

    // The harness takes a ready access token; obtaining and refreshing
    // it is the caller's job.
    let access_token =
        std::env::var("GMAIL_ACCESS_TOKEN").context("GMAIL_ACCESS_TOKEN not set")?;
    let creds = AccessCredentials::new(access_token);

    let mail = GmailTransport::new();
    let generation: Arc<dyn GenerationTransport> = Arc::new(AssistantTransport::new(
        config.openai_api_key.clone(),
        config.assistant_id.clone(),
    ));
    let enricher = Enricher::new(generation)
        .with_batch_size(config.batch_size)
        .with_run_timeout(config.ai_timeout);

    let messages = fetch_unread(&mail, &creds, config.max_messages).await?;
    if messages.is_empty() {
        println!("No unread messages.");
        return Ok(());
    }

    let enrichments = enricher.enrich(&messages).await;

    for (message, enrichment) in messages.iter().zip(&enrichments) {
        println!("── {} — {}", message.date.format("%Y-%m-%d %H:%M"), message.sender);
        println!("   {}", message.subject);
        println!("   {}", enrichment.summary);
        if let Some(translated) = &enrichment.translated_text {
            let language = enrichment.language.as_deref().unwrap_or("?");
            println!("   [{language}] {translated}");
        }
        println!();
    }

    Ok(())
}
