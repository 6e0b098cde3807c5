//! Homebuilder site service
//!
//! Hosts the localization and cache stores for the presentation layer:
//! translations, language selection, the image-seen set and cache upkeep.

mod config;
mod error;
mod routes;
mod server;
mod state;
mod sweeper;

use std::sync::Arc;

use homebuilder_cache::{CacheStore, SystemClock};
use homebuilder_i18n::{
    preload_all, DictionarySource, FileDictionarySource, HttpDictionarySource, LocalizationStore,
};
use homebuilder_storage::{FileStorage, KeyValueStorage};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::Result;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("homebuilder_site=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting homebuilder site service...");

    let config = Config::from_env();
    info!(port = config.port, storage_dir = ?config.storage_dir, "Loaded configuration");

    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(&config.storage_dir)?);
    let source = dictionary_source(&config)?;

    // Catch missing or malformed locales at startup rather than on first render
    for (language, result) in preload_all(source.as_ref()).await {
        if let Err(e) = result {
            warn!(%language, error = %e, "Locale failed to preload");
        }
    }

    let i18n = LocalizationStore::rehydrate(source, storage.clone()).await;
    info!(language = %i18n.language(), ready = i18n.has_dictionary(), "Localization store ready");

    let cache = Arc::new(CacheStore::restore(
        storage,
        config.cache.clone(),
        Arc::new(SystemClock),
    ));
    cache.init();

    let sweeper = sweeper::spawn_cleanup_task(cache.clone(), config.cleanup_interval);

    let state = AppState::new(i18n.clone(), cache.clone());
    let router = server::create_router(state, server::cors_layer(&config.cors_origins));

    let served = server::start_server(router, config.port, shutdown_signal()).await;

    sweeper.abort();
    i18n.dispose();
    cache.dispose();
    info!("Shut down");

    served?;
    Ok(())
}

fn dictionary_source(config: &Config) -> Result<Arc<dyn DictionarySource>> {
    match &config.locales_base_url {
        Some(url) => {
            info!(%url, "Fetching dictionaries over HTTP");
            Ok(Arc::new(HttpDictionarySource::new(url)?))
        }
        None => {
            info!(dir = ?config.locales_dir, "Reading dictionaries from disk");
            Ok(Arc::new(FileDictionarySource::new(&config.locales_dir)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
