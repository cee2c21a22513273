use crate::config::types::{Config, LlmConfig, ScraperConfig, ThrottleConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_throttle_config(&config.throttle)?;
    validate_llm_config(&config.llm)?;
    validate_bind_address(&config.server.bind)?;
    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    if config.max_chars_per_page == 0 {
        return Err(ConfigError::Validation(
            "max_chars_per_page must be >= 1".to_string(),
        ));
    }

    if config.max_chars_per_page > config.max_total_chars {
        return Err(ConfigError::Validation(format!(
            "max_chars_per_page ({}) cannot exceed max_total_chars ({})",
            config.max_chars_per_page, config.max_total_chars
        )));
    }

    Ok(())
}

/// User agent name: non-empty, alphanumeric + hyphens only
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    Ok(())
}

fn validate_throttle_config(config: &ThrottleConfig) -> Result<(), ConfigError> {
    if config.capacity < 1 {
        return Err(ConfigError::Validation(
            "throttle capacity must be >= 1".to_string(),
        ));
    }

    if config.window_secs < 1 {
        return Err(ConfigError::Validation(
            "throttle window_secs must be >= 1".to_string(),
        ));
    }

    if config.sweep_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "throttle sweep_interval_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm_config(config: &LlmConfig) -> Result<(), ConfigError> {
    let base_url = Url::parse(config.base_url())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid llm base_url: {}", e)))?;

    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "llm base_url must use http or https, got '{}'",
            base_url.scheme()
        )));
    }

    if config.model().trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm model cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm api_key_env cannot be empty".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "llm temperature must be between 0 and 2, got {}",
            config.temperature
        )));
    }

    if config.max_output_tokens < 1 {
        return Err(ConfigError::Validation(
            "llm max_output_tokens must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_bind_address(bind: &str) -> Result<(), ConfigError> {
    bind.parse::<std::net::SocketAddr>()
        .map(|_| ())
        .map_err(|e| ConfigError::Validation(format!("Invalid server bind '{}': {}", bind, e)))
}
