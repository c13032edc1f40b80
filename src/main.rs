use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

mod api;
mod config;
mod csv_import;
mod dispatch;
mod error;
mod models;
mod phone;
mod schema;
mod store;
mod template;

use crate::api::AppState;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::store::{ContactStore, MemoryStore, PgStore};
use crate::template::TemplateEngine;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,contact_dispatch=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn ContactStore> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.max_connections)
                .await
                .context("failed to connect to database")?;
            store.migrate().await.context("failed to run migrations")?;
            tracing::info!(max_connections = config.max_connections, "connected to database");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, contacts will be kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let engine = TemplateEngine::new(&config.placeholder_token, &config.preview_name);
    let dispatcher = Arc::new(Dispatcher::new(engine, &config.country_code));

    let app = api::router(AppState { store, dispatcher });

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "server running");

    axum::serve(listener, app).await?;
    Ok(())
}
