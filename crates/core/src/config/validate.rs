use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - search.max_results is not 0
/// - yts.retry.max_attempts is at least 1
/// - jackett.limit is not 0
/// - transmission.url is an http(s) URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.search.max_results == 0 {
        return Err(ConfigError::ValidationError(
            "search.max_results cannot be 0".to_string(),
        ));
    }

    if config.yts.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "yts.retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.jackett.limit == 0 {
        return Err(ConfigError::ValidationError(
            "jackett.limit cannot be 0".to_string(),
        ));
    }

    if let Some(transmission) = &config.transmission {
        let url = transmission.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "transmission.url must start with http:// or https://, got {:?}",
                transmission.url
            )));
        }
    }

    Ok(())
}
