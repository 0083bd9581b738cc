//! Configuration module for the WebCrawlerAPI client
//!
//! This module handles building, loading, and validating client configuration.
//! A configuration can be built in code, read from a TOML file, or taken from
//! the environment.
//!
//! # Example
//!
//! ```no_run
//! use webcrawlerapi::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("webcrawlerapi.toml")).unwrap();
//! println!("Talking to: {}", config.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClientConfig, PollSettings, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_MAX_POLLS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
