use crate::config::types::ClientConfig;
use crate::config::validation::validate;
use crate::ConfigResult;
use serde::Deserialize;
use std::path::Path;

/// On-disk layout: an `[api]` table plus an optional `[polling]` table
#[derive(Debug, Deserialize)]
struct ConfigFile {
    api: ClientConfig,
    #[serde(default)]
    polling: Option<crate::config::PollSettings>,
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(ClientConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use webcrawlerapi::config::load_config;
///
/// let config = load_config(Path::new("webcrawlerapi.toml")).unwrap();
/// println!("Max polls: {}", config.polling.max_polls);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<ClientConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> ConfigResult<ClientConfig> {
    let file: ConfigFile = toml::from_str(content)?;

    let mut config = file.api;
    if let Some(polling) = file.polling {
        config.polling = polling;
    }
    config.base_url = config.base_url.trim_end_matches('/').to_string();

    validate(&config)?;

    Ok(config)
}
