use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use webrev_audit::config::Config;
use webrev_audit::extract::Extractor;
use webrev_audit::llm::GroqProvider;
use webrev_audit::pipeline::{Generator, Pipeline};
use webrev_audit::rate_limit::RateLimiter;
use webrev_audit::routes::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::parse();

    let provider = Arc::new(GroqProvider::new(config.provider_url.clone()));
    let pipeline = Pipeline::new(Extractor::new()?, Generator::new(provider));
    let state = AppState {
        pipeline,
        default_credential: Arc::from(config.api_key.as_str()),
    };
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit,
        Duration::from_secs(config.rate_window_secs),
    ));

    let app = routes::router(state, limiter);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
