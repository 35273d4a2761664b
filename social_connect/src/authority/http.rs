use async_trait::async_trait;
use http::StatusCode;
use http::header::ACCEPT;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::env;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

use crate::connection::{Connection, PlatformPost};
use crate::errors::{ConnectError, RefreshFailure};
use crate::session::SessionUser;

use super::BackendAuthority;
use super::types::{
    AuthorityErrorBody, AuthorizationUrlRequest, AuthorizationUrlResponse, CodeExchangeRequest,
};

/// Base URL of the backend authority, e.g. `https://api.example.com`.
/// Endpoint paths (`/social/...`) are appended to it.
pub static SOCIAL_AUTHORITY_URL: LazyLock<Option<String>> =
    LazyLock::new(|| env::var("SOCIAL_AUTHORITY_URL").ok());

/// Request timeout for authority calls, in seconds.
/// Default: 30
pub static SOCIAL_HTTP_TIMEOUT_SECS: LazyLock<u64> = LazyLock::new(|| {
    env::var("SOCIAL_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
});

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_MESSAGE_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Authorize,
    Exchange,
    List,
    Delete,
    Refresh,
    Sync,
    Posts,
}

/// [`BackendAuthority`] reached over HTTP with the user's bearer credential.
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpAuthority {
    pub fn new(base_url: &str) -> Result<Self, ConnectError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ConnectError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ConnectError::Configuration(format!("Invalid authority URL '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConnectError::Configuration(format!(
                "Authority URL cannot be a base: {base_url}"
            )));
        }

        Ok(Self {
            base_url,
            client: get_client(timeout)?,
        })
    }

    /// Build from `SOCIAL_AUTHORITY_URL` and `SOCIAL_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConnectError> {
        let base_url = SOCIAL_AUTHORITY_URL.as_deref().ok_or_else(|| {
            ConnectError::Configuration("SOCIAL_AUTHORITY_URL must be set".to_string())
        })?;
        Self::with_timeout(base_url, Duration::from_secs(*SOCIAL_HTTP_TIMEOUT_SECS))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ConnectError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ConnectError::Configuration(format!(
                    "Authority URL cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        user: &SessionUser,
        operation: Operation,
        connection_id: Option<&str>,
    ) -> Result<reqwest::Response, ConnectError> {
        let response = request
            .bearer_auth(user.credential.expose_secret())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ConnectError::Transport(format!("Authority request failed: {e}")).log())?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Authority {:?} failed with {}: {}", operation, status, body);
        let message = error_message(status, &body);
        Err(status_error(operation, status, message, connection_id).log())
    }
}

/// Creates the HTTP client used for authority calls:
///
/// - `timeout`: bounded so a stalled authority can't hang a request handler.
/// - `pool_idle_timeout`: 90 seconds, the reqwest default.
/// - `pool_max_idle_per_host`: 32 idle connections kept per host.
fn get_client(timeout: Duration) -> Result<reqwest::Client, ConnectError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| ConnectError::Configuration(format!("Failed to create HTTP client: {e}")))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ConnectError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ConnectError::Transport(format!("Invalid authority response: {e}")).log())
}

/// Prefer the authority's own message so it can be shown verbatim.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<AuthorityErrorBody>(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    if message.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    message.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

fn status_error(
    operation: Operation,
    status: StatusCode,
    message: String,
    connection_id: Option<&str>,
) -> ConnectError {
    if status == StatusCode::UNAUTHORIZED {
        return ConnectError::NotAuthenticated;
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = connection_id {
            return ConnectError::ConnectionNotFound(id.to_string());
        }
    }

    match operation {
        Operation::Authorize if status.is_client_error() => ConnectError::Configuration(message),
        Operation::Exchange => ConnectError::ExchangeFailed(message),
        Operation::Refresh => ConnectError::RefreshFailed(RefreshFailure::Rejected(message)),
        Operation::Sync => ConnectError::SyncFailed(message),
        Operation::Authorize | Operation::List | Operation::Delete | Operation::Posts => {
            ConnectError::Transport(format!("{status}: {message}"))
        }
    }
}

#[async_trait]
impl BackendAuthority for HttpAuthority {
    async fn authorization_url(
        &self,
        user: &SessionUser,
        request: &AuthorizationUrlRequest,
    ) -> Result<AuthorizationUrlResponse, ConnectError> {
        let mut url = self.endpoint(&["social", "oauth", request.platform.as_str(), "authorize"])?;
        url.query_pairs_mut()
            .append_pair("redirectUri", &request.redirect_uri)
            .append_pair("state", &request.state);

        let response = self
            .send(self.client.get(url), user, Operation::Authorize, None)
            .await?;
        read_json(response).await
    }

    async fn exchange_code(
        &self,
        user: &SessionUser,
        request: &CodeExchangeRequest,
    ) -> Result<Connection, ConnectError> {
        let url = self.endpoint(&["social", "oauth", request.platform.as_str(), "callback"])?;
        let response = self
            .send(
                self.client.post(url).json(request),
                user,
                Operation::Exchange,
                None,
            )
            .await?;
        read_json(response).await
    }

    async fn list_connections(&self, user: &SessionUser) -> Result<Vec<Connection>, ConnectError> {
        let url = self.endpoint(&["social", "connections"])?;
        let response = self
            .send(self.client.get(url), user, Operation::List, None)
            .await?;
        read_json(response).await
    }

    async fn delete_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<(), ConnectError> {
        let url = self.endpoint(&["social", "connections", connection_id])?;
        self.send(
            self.client.delete(url),
            user,
            Operation::Delete,
            Some(connection_id),
        )
        .await?;
        Ok(())
    }

    async fn refresh_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Connection, ConnectError> {
        let url = self.endpoint(&["social", "connections", connection_id, "refresh"])?;
        let response = self
            .send(
                self.client.post(url),
                user,
                Operation::Refresh,
                Some(connection_id),
            )
            .await?;
        read_json(response).await
    }

    async fn sync_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Connection, ConnectError> {
        let url = self.endpoint(&["social", "connections", connection_id, "sync"])?;
        let response = self
            .send(
                self.client.post(url),
                user,
                Operation::Sync,
                Some(connection_id),
            )
            .await?;
        read_json(response).await
    }

    async fn connection_posts(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Vec<PlatformPost>, ConnectError> {
        let url = self.endpoint(&["social", "connections", connection_id, "posts"])?;
        let response = self
            .send(
                self.client.get(url),
                user,
                Operation::Posts,
                Some(connection_id),
            )
            .await?;
        read_json(response).await
    }
}
