//! Connection setup, CLI error type, and backend error mapping.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use qbdeck_client::{ClientOptions, QbClient};
use qbdeck_config::{ConfigError, DeckConfig};
use qbdeck_core::{SelectionPolicy, SourceError, TorrentSource};
use url::Url;

use crate::cli::Cli;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::validation(format!("{:#}", anyhow::Error::new(error)))
    }
}

/// Map a backend failure onto the CLI error type.
pub(crate) fn source_failure(error: SourceError) -> CliError {
    match error {
        SourceError::Unauthorized { operation } => CliError::failure(anyhow!(
            "{operation}: the WebUI rejected the session (check --username/--password)"
        )),
        SourceError::Status {
            operation,
            status,
            body,
        } if body.is_empty() => CliError::failure(anyhow!("{operation}: status {status}")),
        SourceError::Status {
            operation,
            status,
            body,
        } => CliError::failure(anyhow!("{operation}: status {status}: {body}")),
        other => {
            let operation = other.operation();
            CliError::failure(anyhow::Error::new(other).context(operation))
        }
    }
}

/// Load the configuration file and environment, then apply global flags.
pub(crate) fn load_config(cli: &Cli) -> CliResult<DeckConfig> {
    let mut config = qbdeck_config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.server.url = url.to_string();
    }
    if let Some(username) = &cli.username {
        config.server.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        config.server.password = Some(password.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.server.timeout_secs = timeout;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    qbdeck_config::validate(&config)?;
    Ok(config)
}

/// Application context passed to command handlers.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    pub(crate) client: QbClient,
    pub(crate) config: DeckConfig,
}

impl AppContext {
    /// Build the WebUI client and log in when credentials are configured.
    pub(crate) async fn connect(config: DeckConfig, trace_id: &str) -> CliResult<Self> {
        let base_url = config.server_url()?;
        let options = ClientOptions {
            timeout: config.timeout(),
            request_id: Some(trace_id.to_string()),
        };
        let client = QbClient::new(base_url, &options).map_err(source_failure)?;
        let ctx = Self { client, config };
        if ctx.has_credentials() {
            ctx.login().await?;
        }
        Ok(ctx)
    }

    pub(crate) const fn has_credentials(&self) -> bool {
        self.config.server.username.is_some() && self.config.server.password.is_some()
    }

    /// Log in with the configured credentials.
    pub(crate) async fn login(&self) -> CliResult<()> {
        let (Some(username), Some(password)) = (
            self.config.server.username.as_deref(),
            self.config.server.password.as_deref(),
        ) else {
            return Err(CliError::validation(
                "the WebUI requires a login (pass --username/--password or set QBDECK_USERNAME/QBDECK_PASSWORD)",
            ));
        };
        self.client
            .login(username, password)
            .await
            .map_err(source_failure)
    }

    /// Shared handle for background tasks; the session is shared with `client`.
    pub(crate) fn source(&self) -> Arc<dyn TorrentSource> {
        Arc::new(self.client.clone())
    }

    pub(crate) fn policy(&self, requested: Option<SelectionPolicy>) -> SelectionPolicy {
        requested.unwrap_or(self.config.sidebar.selection_policy)
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

#[cfg(test)]
pub(crate) fn context_for(base_url: &str) -> AppContext {
    let mut config = DeckConfig::default();
    config.server.url = base_url.to_string();
    let url = Url::parse(base_url).expect("mock server URL");
    let client = QbClient::new(url, &ClientOptions::default()).expect("client builds");
    AppContext { client, config }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use httpmock::MockServer;
    use httpmock::prelude::*;

    #[test]
    fn validation_and_failure_use_distinct_exit_codes() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("down")).exit_code(), 3);
    }

    #[test]
    fn status_errors_keep_code_and_body() {
        let err = source_failure(SourceError::Status {
            operation: "torrents.info",
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.display_message(), "torrents.info: status 500: boom");
    }

    #[test]
    fn network_errors_name_the_operation() {
        let err = source_failure(qbdeck_test_support::mocks::network_failure("torrents.info"));
        let message = err.display_message();
        assert!(message.starts_with("torrents.info"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn flags_override_configuration() {
        let cli = Cli::parse_from([
            "qbdeck",
            "--api-url",
            "http://nas.local:9090",
            "--timeout",
            "30",
            "--username",
            "admin",
            "sidebar",
        ]);
        let config = load_config(&cli).expect("config loads");
        assert_eq!(config.server.url, "http://nas.local:9090/");
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.server.username.as_deref(), Some("admin"));
    }

    #[test]
    fn out_of_range_timeout_is_a_validation_error() {
        let cli = Cli::parse_from(["qbdeck", "--timeout", "0", "sidebar"]);
        let err = load_config(&cli).expect_err("zero timeout");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn connect_logs_in_with_credentials() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200)
                .header("set-cookie", "SID=s1; HttpOnly; path=/")
                .body("Ok.");
        });

        let mut config = DeckConfig::default();
        config.server.url = server.base_url();
        config.server.username = Some("admin".to_string());
        config.server.password = Some("secret".to_string());
        let ctx = AppContext::connect(config, "trace")
            .await
            .expect("connect succeeds");
        assert!(ctx.client.has_session());
        login.assert();
    }

    #[tokio::test]
    async fn login_without_credentials_is_a_validation_error() {
        let ctx = context_for("http://127.0.0.1:9/");
        let err = ctx.login().await.expect_err("no credentials");
        assert_eq!(err.exit_code(), 2);
    }
}
