use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tabsync_core::{
    CatalogClient, Config, RequestSigner, SanitizedConfig, SearchEngine, SheetConverter,
    WebhookClient, WebhookStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: CatalogClient,
    search: SearchEngine,
    converter: SheetConverter,
    delivery: WebhookClient,
    webhook_store: WebhookStore,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: CatalogClient,
        search: SearchEngine,
        delivery: WebhookClient,
        webhook_store: WebhookStore,
    ) -> Self {
        Self {
            config,
            catalog,
            search,
            converter: SheetConverter::new(),
            delivery,
            webhook_store,
            started_at: Instant::now(),
        }
    }

    /// Build every component from configuration.
    ///
    /// The catalog client and the search engine share one signer so both
    /// present the same device identity upstream.
    pub fn from_config(config: Config, webhook_store: WebhookStore) -> Result<Self> {
        let signer = Arc::new(RequestSigner::new(config.catalog.user_agent.clone()));

        let catalog = CatalogClient::new(&config.catalog, Arc::clone(&signer))
            .context("Failed to create catalog client")?;
        let search = SearchEngine::new(&config.search, &config.catalog, signer)
            .context("Failed to create search engine")?;
        let delivery =
            WebhookClient::new(&config.delivery).context("Failed to create webhook client")?;

        Ok(Self::new(config, catalog, search, delivery, webhook_store))
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn converter(&self) -> &SheetConverter {
        &self.converter
    }

    pub fn delivery(&self) -> &WebhookClient {
        &self.delivery
    }

    pub fn webhook_store(&self) -> &WebhookStore {
        &self.webhook_store
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
