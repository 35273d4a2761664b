//! Client side of the backend authority that holds platform credentials.

mod http;
mod types;

use async_trait::async_trait;

use crate::connection::{Connection, PlatformPost};
use crate::errors::ConnectError;
use crate::session::SessionUser;

pub use http::{HttpAuthority, SOCIAL_AUTHORITY_URL, SOCIAL_HTTP_TIMEOUT_SECS};
pub use types::{AuthorizationUrlRequest, AuthorizationUrlResponse, CodeExchangeRequest};

/// Operations the backend authority performs on behalf of a user.
///
/// Every call carries the user so the authority can enforce ownership; the
/// authority is the only component that ever talks to a platform.
#[async_trait]
pub trait BackendAuthority: Send + Sync + 'static {
    async fn authorization_url(
        &self,
        user: &SessionUser,
        request: &AuthorizationUrlRequest,
    ) -> Result<AuthorizationUrlResponse, ConnectError>;

    /// Exchange an authorization code; the authority persists and returns
    /// the resulting connection.
    async fn exchange_code(
        &self,
        user: &SessionUser,
        request: &CodeExchangeRequest,
    ) -> Result<Connection, ConnectError>;

    async fn list_connections(&self, user: &SessionUser) -> Result<Vec<Connection>, ConnectError>;

    /// Returns `ConnectionNotFound` when the authority has no such record.
    async fn delete_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<(), ConnectError>;

    async fn refresh_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Connection, ConnectError>;

    async fn sync_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Connection, ConnectError>;

    async fn connection_posts(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Vec<PlatformPost>, ConnectError>;
}
