mod actions;
mod api;
mod chat;
mod config;
mod dispatch;
mod error;
mod provision;
mod readiness;
mod ssh;
mod state;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use cf_infra::AccountPool;
use cf_store::{ProjectRegistry, RedisStore};
use slack_api::SlackClient;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::api::api_router;
use crate::chat::SlackTransport;
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::error::BotError;
use crate::readiness::TcpProbe;
use crate::ssh::SshClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), BotError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(env = %config.env, "application started");

    // Registry
    let store = RedisStore::connect(&config.redis_url).await?;
    let registry = Arc::new(ProjectRegistry::new(Arc::new(store), &config.env));
    registry.ping().await?;

    // Cloud accounts
    let pool = AccountPool::digitalocean(
        &config.digitalocean_tokens,
        config.digitalocean_master_token.as_deref(),
    )?;

    let workshop = Arc::new(config.workshop.clone());
    let slack = SlackClient::new(&config.slack_bot_token, &config.slack_app_token);

    let state = AppState::new(
        Arc::new(SlackTransport::new(slack.clone())),
        registry.clone(),
        pool,
        workshop.clone(),
        Arc::new(SshClient::new(registry, workshop)),
        Arc::new(TcpProbe),
    );

    let mut dispatcher = Dispatcher::new(state.clone());
    actions::register_all(&mut dispatcher)?;
    tokio::spawn(async move { dispatcher.listen(&slack).await });

    let app = api_router(state).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;

    tracing::info!(addr = %config.http_addr, "created http server");

    axum::serve(listener, app).await?;
    Ok(())
}
