//! Persisted webhook destination.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::StoreError;

/// Shortest URL accepted as a destination.
const MIN_URL_LEN: usize = 10;

/// The single webhook destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>, enabled: bool) -> Self {
        Self {
            url: url.into(),
            enabled,
            ..Default::default()
        }
    }

    /// Check the destination URL.
    pub fn validate(&self) -> Result<(), StoreError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(StoreError::Invalid("webhook URL is required".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(StoreError::Invalid(
                "webhook URL must start with http:// or https://".to_string(),
            ));
        }
        if url.len() < MIN_URL_LEN {
            return Err(StoreError::Invalid("webhook URL is too short".to_string()));
        }
        Ok(())
    }
}

/// Holds the webhook destination, optionally mirrored to a JSON file.
///
/// Readers never observe a half-written value: in memory the config sits
/// behind a reader/writer lock, on disk it is replaced by rename.
pub struct WebhookStore {
    path: Option<PathBuf>,
    config: RwLock<WebhookConfig>,
}

impl WebhookStore {
    /// Open the store, loading any persisted config.
    ///
    /// A missing file means no destination yet; an unreadable one is logged
    /// and ignored.
    pub async fn open(path: Option<PathBuf>) -> Self {
        let config = match &path {
            Some(p) => load(p).await,
            None => WebhookConfig::default(),
        };

        Self {
            path,
            config: RwLock::new(config),
        }
    }

    /// In-memory store with no persistence.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            config: RwLock::new(WebhookConfig::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn get(&self) -> WebhookConfig {
        self.config.read().await.clone()
    }

    /// Validate and store a new destination.
    ///
    /// Keeps the original `created_at` and stamps `updated_at`. The write lock
    /// is held across persistence so concurrent saves cannot interleave.
    pub async fn save(&self, mut config: WebhookConfig) -> Result<WebhookConfig, StoreError> {
        config.validate()?;
        config.url = config.url.trim().to_string();

        let mut current = self.config.write().await;

        let now = Utc::now();
        config.created_at = current.created_at.or(Some(now));
        config.updated_at = Some(now);

        if let Some(path) = &self.path {
            persist(path, &config).await?;
        }

        *current = config.clone();
        info!(enabled = config.enabled, "Webhook destination saved");
        Ok(config)
    }

    /// Whether a destination is set and enabled.
    pub async fn is_configured(&self) -> bool {
        let config = self.config.read().await;
        config.enabled && !config.url.is_empty()
    }

    /// The destination URL, only when enabled.
    pub async fn url(&self) -> Option<String> {
        let config = self.config.read().await;
        (config.enabled && !config.url.is_empty()).then(|| config.url.clone())
    }

    /// Forget the destination and remove the persisted file.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut current = self.config.write().await;

        if let Some(path) = &self.path {
            match fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(e)),
            }
        }

        *current = WebhookConfig::default();
        info!("Webhook destination cleared");
        Ok(())
    }
}

async fn load(path: &Path) -> WebhookConfig {
    let data = match fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No persisted webhook config");
            return WebhookConfig::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read webhook config");
            return WebhookConfig::default();
        }
    };

    match serde_json::from_slice(&data) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring malformed webhook config");
            WebhookConfig::default()
        }
    }
}

/// Write to a sibling temp file, then rename over the target.
async fn persist(path: &Path, config: &WebhookConfig) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let data = serde_json::to_vec_pretty(config)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let tmp = temp_path(path);
    fs::write(&tmp, &data).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(StoreError::Io(e));
    }

    debug!(path = %path.display(), "Persisted webhook config");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
