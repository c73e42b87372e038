use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upstream URLs are http(s)
/// - Timeouts are non-zero
/// - Delivery backoff parameters are coherent
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    check_url("catalog.api_base_url", &config.catalog.api_base_url)?;
    check_url("search.search_page_url", &config.search.search_page_url)?;
    if let Some(proxy) = config.search.bypass_proxy_url.as_deref() {
        // An empty value disables the proxy
        if !proxy.is_empty() {
            check_url("search.bypass_proxy_url", proxy)?;
        }
    }

    if config.catalog.timeout_secs == 0 {
        return Err(invalid("catalog.timeout_secs cannot be 0"));
    }
    if config.search.timeout_secs == 0 {
        return Err(invalid("search.timeout_secs cannot be 0"));
    }

    let delivery = &config.delivery;
    if delivery.timeout_secs == 0 {
        return Err(invalid("delivery.timeout_secs cannot be 0"));
    }
    if delivery.multiplier < 1.0 {
        return Err(invalid("delivery.multiplier must be >= 1.0"));
    }
    if !(0.0..=1.0).contains(&delivery.randomization_factor) {
        return Err(invalid(
            "delivery.randomization_factor must be between 0.0 and 1.0",
        ));
    }
    if delivery.initial_interval_ms > delivery.max_interval_ms {
        return Err(invalid(
            "delivery.initial_interval_ms cannot exceed delivery.max_interval_ms",
        ));
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL, got '{}'",
            field, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse().unwrap(),
                port: 0,
            },
            ..Config::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bad_proxy_url_fails() {
        let mut config = Config::default();
        config.search.bypass_proxy_url = Some("localhost:8191".to_string());
        assert!(validate_config(&config).is_err());

        config.search.bypass_proxy_url = Some(String::new());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_backoff_parameters() {
        let mut config = Config::default();
        config.delivery.randomization_factor = 1.5;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.delivery.multiplier = 0.5;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.delivery.initial_interval_ms = 20_000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.delivery.timeout_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("delivery.timeout_secs"));
    }
}
