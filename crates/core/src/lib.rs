pub mod catalog;
pub mod config;
pub mod convert;
pub mod delivery;
pub mod search;
pub mod store;

pub use catalog::{CatalogClient, CatalogError, RawTab, RequestSigner};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use convert::{ChordParser, ConversionResult, ConvertError, SheetConverter};
pub use delivery::{
    BackoffPolicy, DeliveryError, DeliveryResult, WebhookClient, WebhookPayload,
};
pub use search::{SearchEngine, SearchError, SearchQuery, SearchResult};
pub use store::{StoreError, WebhookConfig, WebhookStore};
