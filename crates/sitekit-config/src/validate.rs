//! Validation rules applied after all layers are merged.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first offending field.
pub fn validate(config: &Config) -> ConfigResult<()> {
    let separator = single_char(&config.storage.path_separator).ok_or_else(|| {
        invalid(
            "storage.path_separator",
            format!(
                "must be exactly one non-whitespace character, got {:?}",
                config.storage.path_separator
            ),
        )
    })?;

    if config.storage.module_root.trim().is_empty() {
        return Err(invalid("storage.module_root", "must not be empty"));
    }

    if config.bootstrap.route_host_param.trim().is_empty() {
        return Err(invalid("bootstrap.route_host_param", "must not be empty"));
    }

    if config.bootstrap.phase_timeout_ms == Some(0) {
        return Err(invalid(
            "bootstrap.phase_timeout_ms",
            "must be greater than zero; omit it to disable the timeout",
        ));
    }

    let mut seen = HashSet::new();
    for name in &config.bootstrap.core_modules {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(invalid("bootstrap.core_modules", "module names must not be empty"));
        }
        if trimmed.contains(separator) {
            return Err(invalid(
                "bootstrap.core_modules",
                format!("module name {trimmed:?} contains the path separator"),
            ));
        }
        if !seen.insert(trimmed) {
            return Err(invalid(
                "bootstrap.core_modules",
                format!("module {trimmed:?} is listed twice"),
            ));
        }
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!("unknown level {:?}", config.logging.level),
        ));
    }
    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!("unknown format {:?}", config.logging.format),
        ));
    }

    Ok(())
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_whitespace() => Some(c),
        _ => None,
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}
