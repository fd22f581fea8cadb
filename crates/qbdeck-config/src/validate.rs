//! Range and format checks applied after loading.

use std::ops::RangeInclusive;

use crate::error::{ConfigError, ConfigResult};
use crate::model::DeckConfig;

const SECONDS_RANGE: RangeInclusive<u64> = 1..=300;
const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Validate a loaded document.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidField`] encountered.
pub fn validate(config: &DeckConfig) -> ConfigResult<()> {
    let url = config.server_url()?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "server",
            "url",
            Some(config.server.url.clone()),
            "must use the http or https scheme",
        ));
    }

    check_seconds("server", "timeout_secs", config.server.timeout_secs)?;
    check_seconds("poll", "interval_secs", config.poll.interval_secs)?;

    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::invalid(
            "logging",
            "level",
            None,
            "must not be empty",
        ));
    }
    if let Some(format) = &config.logging.format
        && !LOG_FORMATS.contains(&format.trim().to_ascii_lowercase().as_str())
    {
        return Err(ConfigError::invalid(
            "logging",
            "format",
            Some(format.clone()),
            "must be 'json' or 'pretty'",
        ));
    }
    Ok(())
}

fn check_seconds(section: &str, field: &str, value: u64) -> ConfigResult<()> {
    if SECONDS_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            section,
            field,
            Some(value.to_string()),
            "must be between 1 and 300 seconds",
        ))
    }
}
