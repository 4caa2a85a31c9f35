//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::path::Path;

use crate::common::error::ConfigError;
use crate::config::parser::load_config;
use crate::config::types::Config;

/// Load configuration from a file and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let config = load_config(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }

    // Validate IRC config
    if config.irc.server.is_empty() {
        errors.push("irc.server is required".to_string());
    }
    if config.irc.port == 0 {
        errors.push("irc.port must be non-zero".to_string());
    }
    if config.irc.nickname.is_empty() {
        errors.push("irc.nickname is required".to_string());
    }

    // Validate relay pairings
    if config.relays.is_empty() {
        errors.push("no [[relay]] tables configured - nothing to bridge".to_string());
    }
    for (i, relay) in config.relays.iter().enumerate() {
        if relay.irc_channel.is_empty() {
            errors.push(format!("relay[{}].irc_channel is required", i));
        } else if !relay.irc_channel.starts_with('#') && !relay.irc_channel.starts_with('&') {
            errors.push(format!(
                "relay[{}].irc_channel '{}' is not a channel name",
                i, relay.irc_channel
            ));
        }
        if relay.discord_channel_id == 0 {
            errors.push(format!("relay[{}].discord_channel_id must be non-zero", i));
        }
        if let Some(ref url) = relay.discord_webhook_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                errors.push(format!(
                    "relay[{}].discord_webhook_url '{}' is not an HTTP URL",
                    i, url
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
