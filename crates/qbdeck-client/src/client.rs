//! Session-aware HTTP client for the WebUI API.
//!
//! # Design
//! - One [`QbClient`] owns a `reqwest::Client` and the cookie jar holding
//!   the `SID` issued by `auth/login`; reqwest replays it on every request.
//! - `401`/`403` surface as [`SourceError::Unauthorized`] so the poll loop
//!   can ask for a fresh login.
//! - Bodies are read before decoding so transport and decode failures stay
//!   distinguishable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qbdeck_core::{
    FileEntry, FilePriority, PeersDelta, PieceState, SourceError, SourceResult, Torrent,
    TorrentProperties, TorrentSource, Tracker,
};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Header carrying the per-invocation trace identifier.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Name of the WebUI session cookie.
pub const SESSION_COOKIE: &str = "SID";

const LOGIN_ACCEPTED: &str = "Ok.";

/// Construction options for [`QbClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Value sent in [`HEADER_REQUEST_ID`] with every request.
    pub request_id: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            request_id: None,
        }
    }
}

/// WebUI API client.
#[derive(Debug, Clone)]
pub struct QbClient {
    http: Client,
    base_url: Url,
    cookies: Arc<Jar>,
}

impl QbClient {
    /// Build a client for the WebUI at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Network`] when the request id is not a valid
    /// header value or the HTTP client cannot be constructed.
    pub fn new(base_url: Url, options: &ClientOptions) -> SourceResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(request_id) = &options.request_id {
            let value =
                HeaderValue::from_str(request_id).map_err(|err| SourceError::Network {
                    operation: "client.build",
                    source: Box::new(err),
                })?;
            headers.insert(HEADER_REQUEST_ID, value);
        }
        let cookies = Arc::new(Jar::default());
        let http = Client::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|err| SourceError::Network {
                operation: "client.build",
                source: Box::new(err),
            })?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url),
            cookies,
        })
    }

    /// WebUI base URL, always ending in `/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the jar holds a session cookie for the WebUI.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.cookies.cookies(&self.base_url).is_some()
    }

    /// Authenticate; the jar keeps the returned `SID`.
    ///
    /// A successful login without a cookie (authentication bypassed for the
    /// client address) leaves the jar empty.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unauthorized`] when the credentials are refused
    /// or the address is banned, and the usual transport errors otherwise.
    pub async fn login(&self, username: &str, password: &str) -> SourceResult<()> {
        const OPERATION: &str = "auth.login";
        let response = self
            .request(OPERATION, Method::POST, "api/v2/auth/login")?
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|err| network(OPERATION, err))?;
        let response = check_status(OPERATION, response).await?;
        let body = read_text(OPERATION, response).await?;
        if body.trim() != LOGIN_ACCEPTED {
            debug!(operation = OPERATION, "login refused");
            return Err(SourceError::Unauthorized {
                operation: OPERATION,
            });
        }
        debug!(
            operation = OPERATION,
            cookie = self.has_session(),
            "login accepted"
        );
        Ok(())
    }

    /// End the session on the server and forget the local `SID`.
    ///
    /// # Errors
    ///
    /// Returns transport or status errors from the logout request.
    pub async fn logout(&self) -> SourceResult<()> {
        self.post_form("auth.logout", "api/v2/auth/logout", &[])
            .await?;
        self.cookies.add_cookie_str(
            &format!("{SESSION_COOKIE}=; Max-Age=0; Path=/"),
            &self.base_url,
        );
        Ok(())
    }

    /// Add torrents by magnet link or HTTP URL.
    ///
    /// # Errors
    ///
    /// Returns transport or status errors; an empty list is a no-op.
    pub async fn add_torrent_urls(&self, urls: &[String]) -> SourceResult<()> {
        if urls.is_empty() {
            return Ok(());
        }
        self.post_form(
            "torrents.add",
            "api/v2/torrents/add",
            &[("urls", urls.join("\n"))],
        )
        .await?;
        Ok(())
    }

    fn request(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
    ) -> SourceResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| SourceError::Network {
                operation,
                source: Box::new(err),
            })?;
        debug!(operation, %method, path = url.path(), "webui request");
        Ok(self.http.request(method, url))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> SourceResult<T> {
        let response = self
            .request(operation, Method::GET, path)?
            .query(query)
            .send()
            .await
            .map_err(|err| network(operation, err))?;
        let response = check_status(operation, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| network(operation, err))?;
        serde_json::from_slice(&bytes).map_err(|err| SourceError::Decode {
            operation,
            source: Box::new(err),
        })
    }

    async fn post_form(
        &self,
        operation: &'static str,
        path: &str,
        form: &[(&str, String)],
    ) -> SourceResult<String> {
        let response = self
            .request(operation, Method::POST, path)?
            .form(form)
            .send()
            .await
            .map_err(|err| network(operation, err))?;
        let response = check_status(operation, response).await?;
        read_text(operation, response).await
    }
}

#[async_trait]
impl TorrentSource for QbClient {
    async fn fetch_torrents(&self) -> SourceResult<Vec<Torrent>> {
        self.get_json("torrents.info", "api/v2/torrents/info", &[])
            .await
    }

    async fn fetch_properties(&self, hash: &str) -> SourceResult<TorrentProperties> {
        self.get_json(
            "torrents.properties",
            "api/v2/torrents/properties",
            &[("hash", hash.to_string())],
        )
        .await
    }

    async fn fetch_piece_states(&self, hash: &str) -> SourceResult<Vec<PieceState>> {
        self.get_json(
            "torrents.piece_states",
            "api/v2/torrents/pieceStates",
            &[("hash", hash.to_string())],
        )
        .await
    }

    async fn fetch_trackers(&self, hash: &str) -> SourceResult<Vec<Tracker>> {
        self.get_json(
            "torrents.trackers",
            "api/v2/torrents/trackers",
            &[("hash", hash.to_string())],
        )
        .await
    }

    async fn fetch_peers(&self, hash: &str, rid: i64) -> SourceResult<PeersDelta> {
        self.get_json(
            "sync.torrent_peers",
            "api/v2/sync/torrentPeers",
            &[("hash", hash.to_string()), ("rid", rid.to_string())],
        )
        .await
    }

    async fn fetch_files(&self, hash: &str) -> SourceResult<Vec<FileEntry>> {
        self.get_json(
            "torrents.files",
            "api/v2/torrents/files",
            &[("hash", hash.to_string())],
        )
        .await
    }

    async fn set_file_priority(
        &self,
        hash: &str,
        file_ids: &[u64],
        priority: FilePriority,
    ) -> SourceResult<()> {
        if file_ids.is_empty() {
            return Ok(());
        }
        self.post_form(
            "torrents.file_prio",
            "api/v2/torrents/filePrio",
            &[
                ("hash", hash.to_string()),
                ("id", join_ids(file_ids)),
                ("priority", priority.as_i8().to_string()),
            ],
        )
        .await?;
        Ok(())
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    url
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

fn network(operation: &'static str, err: reqwest::Error) -> SourceError {
    SourceError::Network {
        operation,
        source: Box::new(err),
    }
}

async fn read_text(operation: &'static str, response: Response) -> SourceResult<String> {
    response.text().await.map_err(|err| network(operation, err))
}

async fn check_status(operation: &'static str, response: Response) -> SourceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(SourceError::Unauthorized { operation });
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Status {
        operation,
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use qbdeck_core::{PollConfig, PollStatus, TorrentState, poll_torrents};
    use serde_json::json;

    fn client_for(server: &MockServer) -> Result<QbClient> {
        let base = Url::parse(&server.base_url())?;
        QbClient::new(base, &ClientOptions::default()).map_err(|err| anyhow!("{err}"))
    }

    #[test]
    fn base_url_gains_trailing_slash() -> Result<()> {
        let url = normalize_base(Url::parse("http://nas.local:8080/qbt?x=1")?);
        assert_eq!(url.as_str(), "http://nas.local:8080/qbt/");
        assert_eq!(
            url.join("api/v2/torrents/info")?.as_str(),
            "http://nas.local:8080/qbt/api/v2/torrents/info"
        );
        Ok(())
    }

    #[test]
    fn file_ids_are_pipe_separated() {
        assert_eq!(join_ids(&[0, 3, 7]), "0|3|7");
        assert_eq!(join_ids(&[]), "");
    }

    #[tokio::test]
    async fn login_stores_sid_and_sends_it_back() -> Result<()> {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/auth/login")
                .form_urlencoded_tuple("username", "admin")
                .form_urlencoded_tuple("password", "secret");
            then.status(200)
                .header("set-cookie", "SID=abc123; HttpOnly; path=/")
                .body("Ok.");
        });
        let info = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/torrents/info")
                .header("cookie", "SID=abc123");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {"hash": "a1", "name": "debian.iso", "state": "uploading", "size": 600}
                ]));
        });

        let client = client_for(&server)?;
        client.login("admin", "secret").await?;
        assert!(client.has_session());

        let torrents = client.fetch_torrents().await?;
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].state, TorrentState::Uploading);
        login.assert();
        info.assert();
        Ok(())
    }

    #[tokio::test]
    async fn logout_posts_and_forgets_the_session() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200)
                .header("set-cookie", "SID=abc123; HttpOnly; path=/")
                .body("Ok.");
        });
        let logout = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/auth/logout")
                .header("cookie", "SID=abc123");
            then.status(200);
        });

        let client = client_for(&server)?;
        client.login("admin", "secret").await?;
        assert!(client.has_session());
        client.logout().await?;
        assert!(!client.has_session());
        logout.assert();
        Ok(())
    }

    #[tokio::test]
    async fn refused_login_is_unauthorized() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200).body("Fails.");
        });

        let client = client_for(&server)?;
        let err = client
            .login("admin", "wrong")
            .await
            .expect_err("login refused");
        assert!(err.is_unauthorized());
        assert!(!client.has_session());
        Ok(())
    }

    #[tokio::test]
    async fn forbidden_maps_to_unauthorized() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(403).body("Forbidden");
        });

        let err = client_for(&server)?
            .fetch_torrents()
            .await
            .expect_err("forbidden");
        assert!(err.is_unauthorized());
        assert_eq!(err.operation(), "torrents.info");
        Ok(())
    }

    #[tokio::test]
    async fn other_statuses_keep_code_and_body() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/properties");
            then.status(404).body("Torrent hash was not found\n");
        });

        let err = client_for(&server)?
            .fetch_properties("missing")
            .await
            .expect_err("not found");
        match err {
            SourceError::Status { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "Torrent hash was not found");
            }
            other => return Err(anyhow!("unexpected error: {other:?}")),
        }
        Ok(())
    }

    #[tokio::test]
    async fn metadata_pending_torrents_keep_the_poll_live() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200).json_body(json!([
                {"hash": "m1", "name": "magnet", "state": "metaDL", "size": 0, "total_size": -1},
                {"hash": "u1", "name": "debian.iso", "state": "uploading", "size": 600, "total_size": 600}
            ]));
        });

        let source: Arc<dyn TorrentSource> = Arc::new(client_for(&server)?);
        let (update_tx, mut updates) = tokio::sync::mpsc::unbounded_channel();
        let handle = poll_torrents(
            source,
            PollConfig::default(),
            move |snapshot| {
                let _ = update_tx.send(snapshot);
            },
            || {},
        );

        let snapshot = updates
            .recv()
            .await
            .ok_or_else(|| anyhow!("poll loop closed"))?;
        assert_eq!(snapshot.torrents.len(), 2);
        assert_eq!(snapshot.torrents[0].state, TorrentState::MetaDl);
        assert_eq!(snapshot.torrents[0].total_size, -1);
        assert_eq!(handle.status(), PollStatus::Live);
        handle.cancel();
        Ok(())
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200).body("<html>login</html>");
        });

        let err = client_for(&server)?
            .fetch_torrents()
            .await
            .expect_err("html is not json");
        assert!(matches!(err, SourceError::Decode { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn peers_request_carries_hash_and_rid() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/sync/torrentPeers")
                .query_param("hash", "a1")
                .query_param("rid", "7");
            then.status(200).json_body(json!({
                "rid": 8,
                "peers": {"10.0.0.2:6881": {"client": "qBittorrent", "progress": 0.5}},
                "peers_removed": ["10.0.0.3:6881"]
            }));
        });

        let delta = client_for(&server)?.fetch_peers("a1", 7).await?;
        assert_eq!(delta.rid, 8);
        assert!(!delta.full_update);
        assert_eq!(delta.peers.map(|peers| peers.len()), Some(1));
        assert_eq!(delta.peers_removed, Some(vec!["10.0.0.3:6881".to_string()]));
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn file_priority_posts_joined_ids() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/torrents/filePrio")
                .form_urlencoded_tuple("hash", "a1")
                .form_urlencoded_tuple("id", "0|2")
                .form_urlencoded_tuple("priority", "7");
            then.status(200);
        });

        client_for(&server)?
            .set_file_priority("a1", &[0, 2], FilePriority::Maximal)
            .await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn add_posts_newline_separated_urls() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/torrents/add")
                .form_urlencoded_tuple("urls", "magnet:?xt=urn:btih:a\nmagnet:?xt=urn:btih:b");
            then.status(200).body("Ok.");
        });

        client_for(&server)?
            .add_torrent_urls(&[
                "magnet:?xt=urn:btih:a".to_string(),
                "magnet:?xt=urn:btih:b".to_string(),
            ])
            .await?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn request_id_header_is_sent() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/torrents/files")
                .query_param("hash", "a1")
                .header(HEADER_REQUEST_ID, "trace-1");
            then.status(200).json_body(json!([
                {"index": 0, "name": "a/b.mkv", "size": 10, "progress": 1.0, "priority": 6}
            ]));
        });

        let options = ClientOptions {
            request_id: Some("trace-1".to_string()),
            ..ClientOptions::default()
        };
        let client = QbClient::new(Url::parse(&server.base_url())?, &options)
            .map_err(|err| anyhow!("{err}"))?;
        let files = client.fetch_files("a1").await?;
        assert_eq!(files[0].priority, FilePriority::High);
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() -> Result<()> {
        let options = ClientOptions {
            timeout: Duration::from_secs(2),
            request_id: None,
        };
        let client = QbClient::new(Url::parse("http://127.0.0.1:9/")?, &options)
            .map_err(|err| anyhow!("{err}"))?;
        let err = client.fetch_torrents().await.expect_err("nothing listens");
        assert!(matches!(err, SourceError::Network { .. }));
        Ok(())
    }
}
