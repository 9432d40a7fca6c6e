use anyhow::{Context, Result};
use faq_service::{api, app::FaqApp, config::Config, scheduler};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("faq_service=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!("Starting FAQ service ({})", config.environment);

    let app = FaqApp::from_config(&config).await?;

    // Keep the scheduler alive for the lifetime of the server
    let _sweeper = match &app.memory_cache {
        Some(cache) => {
            Some(scheduler::start_cache_sweeper(cache.clone(), &config.cache_sweep_schedule).await?)
        }
        None => None,
    };

    if config.admin_api_key.is_none() && config.is_production() {
        warn!("Running in production without ADMIN_API_KEY; FAQs cannot be edited");
    }

    let router = api::router(app, config.admin_api_key.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("✓ Listening on http://{}", addr);

    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
}
