use crate::config::types::{ClientConfig, PollSettings};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &ClientConfig) -> ConfigResult<()> {
    validate_api_key(&config.api_key)?;
    validate_base_url(&config.base_url)?;
    validate_poll_settings(&config.polling)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_api_key(api_key: &str) -> ConfigResult<()> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key cannot be empty".to_string(),
        ));
    }

    // Header values cannot carry control characters
    if api_key.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "api_key contains control characters".to_string(),
        ));
    }

    Ok(())
}

fn validate_base_url(base_url: &str) -> ConfigResult<()> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' cannot carry a query or fragment",
            base_url
        )));
    }

    Ok(())
}

fn validate_poll_settings(polling: &PollSettings) -> ConfigResult<()> {
    if polling.max_polls < 1 {
        return Err(ConfigError::Validation(format!(
            "max_polls must be >= 1, got {}",
            polling.max_polls
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("https://api.webcrawlerapi.com").is_ok());
        assert!(validate_base_url("http://127.0.0.1:4000").is_ok());

        assert!(validate_base_url("").is_err());
        assert!(validate_base_url("ftp://api.webcrawlerapi.com").is_err());
        assert!(validate_base_url("https://api.webcrawlerapi.com/?x=1").is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("abc123").is_ok());

        assert!(validate_api_key("").is_err());
        assert!(validate_api_key("   ").is_err());
        assert!(validate_api_key("abc\n").is_err());
    }

    #[test]
    fn test_validate_poll_settings() {
        assert!(validate_poll_settings(&PollSettings::default()).is_ok());

        let zero = PollSettings {
            max_polls: 0,
            poll_interval_ms: 0,
        };
        assert!(validate_poll_settings(&zero).is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = ClientConfig::new("key");
        config.request_timeout_secs = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }
}
