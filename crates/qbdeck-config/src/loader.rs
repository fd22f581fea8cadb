//! Loading: YAML file, then environment overrides, then validation.

use std::fs;
use std::path::Path;

use qbdeck_core::SelectionPolicy;

use crate::defaults::{
    ENV_API_URL, ENV_HTTP_TIMEOUT_SECS, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_PASSWORD,
    ENV_POLL_INTERVAL_SECS, ENV_SELECTION_POLICY, ENV_USERNAME,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::DeckConfig;
use crate::validate::validate;

/// Load configuration from `path` (when given) and the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the file cannot be read or parsed, an
/// environment override is malformed, or validation fails.
pub fn load(path: Option<&Path>) -> ConfigResult<DeckConfig> {
    load_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<DeckConfig> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => DeckConfig::default(),
    };
    apply_env_overrides(&mut config, lookup)?;
    validate(&config)?;
    tracing::debug!(
        url = %config.server.url,
        interval_secs = config.poll.interval_secs,
        "configuration loaded"
    );
    Ok(config)
}

fn read_file(path: &Path) -> ConfigResult<DeckConfig> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    from_yaml_str(&text, path)
}

/// Parse a YAML document; `path` is only used for error context.
///
/// An empty document yields the defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed YAML or unknown fields.
pub fn from_yaml_str(text: &str, path: &Path) -> ConfigResult<DeckConfig> {
    if text.trim().is_empty() {
        return Ok(DeckConfig::default());
    }
    serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `QBDECK_*` overrides found through `lookup`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when a numeric or enumerated
/// override does not parse.
pub fn apply_env_overrides(
    config: &mut DeckConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<()> {
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = lookup(ENV_API_URL) {
        config.server.url = url;
    }
    if let Some(username) = lookup(ENV_USERNAME) {
        config.server.username = Some(username);
    }
    if let Some(password) = lookup(ENV_PASSWORD) {
        config.server.password = Some(password);
    }
    if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_SECS) {
        config.server.timeout_secs = parse_secs(ENV_HTTP_TIMEOUT_SECS, &raw)?;
    }
    if let Some(raw) = lookup(ENV_POLL_INTERVAL_SECS) {
        config.poll.interval_secs = parse_secs(ENV_POLL_INTERVAL_SECS, &raw)?;
    }
    if let Some(raw) = lookup(ENV_SELECTION_POLICY) {
        config.sidebar.selection_policy = raw.parse::<SelectionPolicy>().map_err(|_| {
            ConfigError::invalid(
                "env",
                ENV_SELECTION_POLICY,
                Some(raw.clone()),
                "must be 'exclusive' or 'stacked'",
            )
        })?;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.logging.format = Some(format);
    }
    Ok(())
}

fn parse_secs(key: &str, raw: &str) -> ConfigResult<u64> {
    raw.trim().parse().map_err(|_| {
        ConfigError::invalid(
            "env",
            key,
            Some(raw.to_string()),
            "must be a whole number of seconds",
        )
    })
}
