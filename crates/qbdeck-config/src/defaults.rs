//! Default values and environment variable names.

/// Default WebUI endpoint.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default delay between collection fetches in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Path of the YAML configuration file.
pub const ENV_CONFIG_PATH: &str = "QBDECK_CONFIG";
/// Overrides `server.url`.
pub const ENV_API_URL: &str = "QBDECK_API_URL";
/// Overrides `server.username`.
pub const ENV_USERNAME: &str = "QBDECK_USERNAME";
/// Overrides `server.password`.
pub const ENV_PASSWORD: &str = "QBDECK_PASSWORD";
/// Overrides `server.timeout_secs`.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "QBDECK_HTTP_TIMEOUT_SECS";
/// Overrides `poll.interval_secs`.
pub const ENV_POLL_INTERVAL_SECS: &str = "QBDECK_POLL_INTERVAL_SECS";
/// Overrides `sidebar.selection_policy`.
pub const ENV_SELECTION_POLICY: &str = "QBDECK_SELECTION_POLICY";
/// Overrides `logging.level`.
pub const ENV_LOG_LEVEL: &str = "QBDECK_LOG_LEVEL";
/// Overrides `logging.format`.
pub const ENV_LOG_FORMAT: &str = "QBDECK_LOG_FORMAT";
