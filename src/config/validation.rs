use crate::attacks::all_attacks;
use crate::config::types::{AttacksConfig, ClientConfig, Config, CrawlerConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_crawler_config(&config.crawler)?;
    validate_attacks_config(&config.attacks)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.max_redirects < 1 || config.max_redirects > 30 {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be between 1 and 30, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

/// Validates crawl configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    for content_type in &config.non_page_content_types {
        validate_content_type(content_type)?;
    }

    Ok(())
}

/// Validates a `type/subtype` media type
fn validate_content_type(content_type: &str) -> Result<(), ConfigError> {
    let valid = match content_type.trim().split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && !subtype.contains('/')
                && !content_type.contains(';')
                && !content_type.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::Validation(format!(
            "'{}' is not a type/subtype content type",
            content_type
        )));
    }

    Ok(())
}

/// Validates that every enabled attack exists
fn validate_attacks_config(config: &AttacksConfig) -> Result<(), ConfigError> {
    let Some(enabled) = &config.enabled else {
        return Ok(());
    };

    let known: Vec<&str> = all_attacks().iter().map(|a| a.name).collect();
    for name in enabled {
        if !known.contains(&name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown attack '{}', expected one of: {}",
                name,
                known.join(", ")
            )));
        }
    }

    Ok(())
}
