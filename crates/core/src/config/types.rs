use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Catalog API configuration (tab lookups and authenticated search).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog API (e.g., "https://api.ultimate-guitar.com/api/v1")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// User-Agent of the mobile client the API expects
    #[serde(default = "default_catalog_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            user_agent: default_catalog_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }
}

fn default_api_base_url() -> String {
    "https://api.ultimate-guitar.com/api/v1".to_string()
}

fn default_catalog_user_agent() -> String {
    "UGT_ANDROID/4.11.1 (Pixel; 8.1.0)".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Web search fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Public search page used by the markup fallbacks
    #[serde(default = "default_search_page_url")]
    pub search_page_url: String,
    /// Optional browser-rendering proxy (FlareSolverr-compatible), e.g. "http://localhost:8191"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_proxy_url: Option<String>,
    /// maxTimeout forwarded to the proxy, in milliseconds
    #[serde(default = "default_proxy_max_timeout_ms")]
    pub proxy_max_timeout_ms: u64,
    /// Request timeout in seconds for the page fetch (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_page_url: default_search_page_url(),
            bypass_proxy_url: None,
            proxy_max_timeout_ms: default_proxy_max_timeout_ms(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }
}

fn default_search_page_url() -> String {
    "https://www.ultimate-guitar.com/search.php".to_string()
}

fn default_proxy_max_timeout_ms() -> u64 {
    60_000
}

/// Webhook delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// Per-attempt timeout in seconds (default: 10)
    #[serde(default = "default_delivery_timeout")]
    pub timeout_secs: u32,
    /// Retries after the first attempt (default: 6)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Wall-clock budget for the whole retry sequence (default: 60)
    #[serde(default = "default_max_elapsed_secs")]
    pub max_elapsed_secs: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Jitter applied to every interval, 0.0..=1.0 (default: 0.5)
    #[serde(default = "default_randomization_factor")]
    pub randomization_factor: f64,
    /// Value of the `source` field in delivered payloads
    #[serde(default = "default_source_label")]
    pub source_label: String,
    #[serde(default = "default_delivery_user_agent")]
    pub user_agent: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_delivery_timeout(),
            max_retries: default_max_retries(),
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            max_elapsed_secs: default_max_elapsed_secs(),
            multiplier: default_multiplier(),
            randomization_factor: default_randomization_factor(),
            source_label: default_source_label(),
            user_agent: default_delivery_user_agent(),
        }
    }
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }
}

fn default_delivery_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    6
}

fn default_initial_interval_ms() -> u64 {
    1_000
}

fn default_max_interval_ms() -> u64 {
    16_000
}

fn default_max_elapsed_secs() -> u64 {
    60
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_randomization_factor() -> f64 {
    0.5
}

fn default_source_label() -> String {
    "Ultimate Guitar Scraper".to_string()
}

fn default_delivery_user_agent() -> String {
    format!("TabSync-Webhook/{}", env!("CARGO_PKG_VERSION"))
}

/// Webhook destination store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// JSON file holding the destination. An empty path keeps it in memory only.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn persistence_path(&self) -> Option<&std::path::Path> {
        if self.path.as_os_str().is_empty() {
            None
        } else {
            Some(self.path.as_path())
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/webhook-config.json")
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub catalog: SanitizedCatalogConfig,
    pub search: SanitizedSearchConfig,
    pub delivery: SanitizedDeliveryConfig,
    pub store_persistent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub api_base_url: String,
    pub timeout_secs: u32,
}

/// Sanitized search config (proxy location hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSearchConfig {
    pub search_page_url: String,
    pub bypass_proxy_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDeliveryConfig {
    pub timeout_secs: u32,
    pub max_retries: u32,
    pub max_elapsed_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            catalog: SanitizedCatalogConfig {
                api_base_url: config.catalog.api_base_url.clone(),
                timeout_secs: config.catalog.timeout_secs,
            },
            search: SanitizedSearchConfig {
                search_page_url: config.search.search_page_url.clone(),
                bypass_proxy_configured: config
                    .search
                    .bypass_proxy_url
                    .as_deref()
                    .is_some_and(|u| !u.is_empty()),
                timeout_secs: config.search.timeout_secs,
            },
            delivery: SanitizedDeliveryConfig {
                timeout_secs: config.delivery.timeout_secs,
                max_retries: config.delivery.max_retries,
                max_elapsed_secs: config.delivery.max_elapsed_secs,
            },
            store_persistent: config.store.persistence_path().is_some(),
        }
    }
}
