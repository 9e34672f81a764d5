//! Post-merge configuration validation.
//!
//! Validates that a deserialized [`Config`] is within acceptable ranges and
//! that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_server(config)?;
    validate_session(config)?;
    validate_mcp(config)?;
    validate_hitl(config)?;
    validate_connection(config)?;
    validate_storage(config)?;
    validate_rules(config)?;
    validate_logging(config)?;
    Ok(())
}

fn field_err(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate_server(config: &Config) -> ConfigResult<()> {
    if config.server.port == 0 {
        return Err(field_err("server.port", "port must be nonzero"));
    }
    if config.server.bind_addr.trim().is_empty() {
        return Err(field_err("server.bind_addr", "bind_addr must not be empty"));
    }
    if !matches!(config.server.auth_mode.as_str(), "bearer" | "api_key" | "disabled") {
        return Err(field_err(
            "server.auth_mode",
            format!(
                "unsupported auth_mode '{}'; expected one of: bearer, api_key, disabled",
                config.server.auth_mode
            ),
        ));
    }
    if config.server.auth_mode == "api_key" && config.server.api_key.is_none() {
        return Err(field_err(
            "server.api_key",
            "auth_mode=api_key requires server.api_key to be set",
        ));
    }
    Ok(())
}

fn validate_session(config: &Config) -> ConfigResult<()> {
    if config.session.timeout_secs == 0 {
        return Err(field_err("session.timeout_secs", "must be greater than zero"));
    }
    if config.session.cleanup_interval_secs == 0 {
        return Err(field_err(
            "session.cleanup_interval_secs",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn validate_mcp(config: &Config) -> ConfigResult<()> {
    let mcp = &config.mcp;
    if mcp.max_connections_per_user == 0 {
        return Err(field_err(
            "mcp.max_connections_per_user",
            "must be greater than zero",
        ));
    }
    if mcp.max_connections_total == 0 {
        return Err(field_err(
            "mcp.max_connections_total",
            "must be greater than zero",
        ));
    }
    if mcp.max_connections_per_user > mcp.max_connections_total {
        return Err(field_err(
            "mcp.max_connections_per_user",
            format!(
                "{} exceeds mcp.max_connections_total ({})",
                mcp.max_connections_per_user, mcp.max_connections_total
            ),
        ));
    }
    Ok(())
}

fn validate_hitl(config: &Config) -> ConfigResult<()> {
    if config.hitl.timeout_secs == 0 {
        return Err(field_err("hitl.timeout_secs", "must be greater than zero"));
    }
    Ok(())
}

fn validate_connection(config: &Config) -> ConfigResult<()> {
    if config.connection.max_total == 0 {
        return Err(field_err("connection.max_total", "must be greater than zero"));
    }
    Ok(())
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    if config.storage.namespace.trim().is_empty() {
        return Err(field_err("storage.namespace", "must not be empty"));
    }
    if config.storage.database.trim().is_empty() {
        return Err(field_err("storage.database", "must not be empty"));
    }
    Ok(())
}

fn validate_rules(config: &Config) -> ConfigResult<()> {
    if config.rules.max_content_size == 0 {
        return Err(field_err("rules.max_content_size", "must be greater than zero"));
    }
    if config.rules.data_root.trim().is_empty() {
        return Err(field_err("rules.data_root", "must not be empty"));
    }
    if config.rules.app_name.trim().is_empty() {
        return Err(field_err("rules.app_name", "must not be empty"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !matches!(config.logging.format.as_str(), "pretty" | "compact" | "json") {
        return Err(field_err(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: pretty, compact, json",
                config.logging.format
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError { field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn per_user_cap_exceeding_total_is_rejected() {
        let mut config = Config::default();
        config.mcp.max_connections_per_user = 500;
        config.mcp.max_connections_total = 200;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unsupported_log_format_is_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(validate(&config).is_err());
    }
}
