//! Configuration module for VC Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so the service also runs without a file.
//!
//! # Example
//!
//! ```no_run
//! use vcscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("vcscout.toml")).unwrap();
//! println!("Fetch timeout: {}ms", config.scraper.fetch_timeout_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, LlmConfig, LlmProvider, ScraperConfig, ServerConfig, ThrottleConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
