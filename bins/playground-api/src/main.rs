mod auth;
mod error;
mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use playground_common::config::Config;
use playground_common::library::Library;
use playground_common::redis::RedisStore;
use playground_common::store::{MemoryStore, Store};
use playground_engine::{Assistant, ExecutionClient, LanguageDetector, OpenAiChat};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct AppState {
    pub executor: ExecutionClient,
    pub assistant: Assistant,
    pub detector: LanguageDetector,
    pub library: Library,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        let chat = Arc::new(OpenAiChat::new(config.openai.clone()));
        Self {
            executor: ExecutionClient::new(config.judge0.clone()),
            assistant: Assistant::new(chat.clone()),
            detector: LanguageDetector::new(chat),
            library: Library::new(store),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialize tracing subscriber
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_target(false);
    if config.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Playground API booting...");

    // Missing credentials only fail the calls that need them
    match config.judge0.base_url() {
        Some(url) => info!(
            sandbox = %url,
            auth = config.judge0.auth_mode().name(),
            "Sandbox configured"
        ),
        None => warn!("JUDGE0_API_HOST not set; /execute will fail until configured"),
    }
    if config.openai.api_key.is_none() {
        warn!("OPENAI_API_KEY not set; assistant and detection endpoints will fail");
    }

    let store: Arc<dyn Store> = match &config.redis_url {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", url))?;
            info!("Connected to Redis: {}", url);
            Arc::new(store)
        }
        None => {
            warn!("REDIS_URL not set; using in-memory storage");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState::new(&config, store));
    let app = routes::routes().with_state(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);
    info!("Ready to accept code");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
