//! Typed configuration document.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use qbdeck_core::{PollConfig, SelectionPolicy};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{
    DEFAULT_API_URL, DEFAULT_LOG_LEVEL, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS,
};
use crate::error::{ConfigError, ConfigResult};

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckConfig {
    /// WebUI endpoint and credentials.
    pub server: ServerConfig,
    /// Refresh cadence.
    pub poll: PollSettings,
    /// Navigation behaviour.
    pub sidebar: SidebarSettings,
    /// Diagnostics output.
    pub logging: LoggingSettings,
}

impl DeckConfig {
    /// Parsed WebUI endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when the URL does not parse.
    pub fn server_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.server.url).map_err(|_| {
            ConfigError::invalid(
                "server",
                "url",
                Some(self.server.url.clone()),
                "must be an absolute URL",
            )
        })
    }

    /// Poll loop settings derived from the document.
    #[must_use]
    pub const fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll.interval_secs),
        }
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }
}

/// WebUI endpoint and credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Base URL of the WebUI.
    pub url: String,
    /// Login name.
    pub username: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Debug for ServerConfig {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServerConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSettings {
    /// Seconds between the end of one fetch and the start of the next.
    pub interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

/// Navigation behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SidebarSettings {
    /// Whether selecting another taxonomy clears the previous filter.
    pub selection_policy: SelectionPolicy,
}

/// Diagnostics output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Level directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `json` or `pretty`; inferred from the build when absent.
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: None,
        }
    }
}
