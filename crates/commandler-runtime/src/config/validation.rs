//! Configuration validation utilities.

use commandler_core::{PatternCache, StandardDispatcherConfig};

use super::error::{ConfigError, ConfigResult};
use super::schema::{CommandlerConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &CommandlerConfig) -> ConfigResult<()> {
    validate_dispatcher_config(&config.standard_dispatcher)?;
    validate_logging_config(&config.logging)?;

    if config.disabled.iter().any(|type_id| type_id.trim().is_empty()) {
        return Err(ConfigError::validation(
            "Disabled controller ids cannot be empty",
        ));
    }
    Ok(())
}

/// Validates the prefixes and delimiter of the standard dispatcher.
fn validate_dispatcher_config(config: &StandardDispatcherConfig) -> ConfigResult<()> {
    if config.prefixes.iter().any(String::is_empty) {
        return Err(ConfigError::validation(
            "Dispatcher prefixes cannot be empty strings; use an empty list to accept every message",
        ));
    }

    let delimiter = PatternCache::new()
        .get_or_compile(&config.delimiter)
        .map_err(|e| ConfigError::invalid_delimiter(&config.delimiter, e.to_string()))?;
    if delimiter.is_match("") {
        return Err(ConfigError::invalid_delimiter(
            &config.delimiter,
            "the delimiter must not match the empty string",
        ));
    }
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(config: &LoggingConfig) -> ConfigResult<()> {
    if config.output == LogOutput::File && config.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if config.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module names cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = CommandlerConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_prefix() {
        let mut config = CommandlerConfig::default();
        config.standard_dispatcher.prefixes = vec!["$".into(), String::new()];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));

        config.standard_dispatcher.prefixes.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_delimiter() {
        let mut config = CommandlerConfig::default();
        config.standard_dispatcher.delimiter = "(".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidDelimiter { .. })
        ));

        config.standard_dispatcher.delimiter = r"\s*".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidDelimiter { .. })
        ));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = CommandlerConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "logging.file_path"
        ));

        config.logging.file_path = Some("commandler.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
