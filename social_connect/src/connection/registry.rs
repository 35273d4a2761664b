use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::authority::BackendAuthority;
use crate::errors::{ConnectError, RefreshFailure};
use crate::session::{SessionUser, require_user};

use super::types::{Connection, ConnectionSummary, PlatformPost};

/// Default age after which synced display metadata counts as stale.
pub const DEFAULT_STALE_AFTER_SECS: i64 = 3600;

/// The user's linked accounts, always read fresh from the authority.
///
/// Nothing is cached here; a partially failed operation is resolved by the
/// next [`ConnectionRegistry::list`].
#[derive(Clone)]
pub struct ConnectionRegistry {
    authority: Arc<dyn BackendAuthority>,
    stale_after: Duration,
}

impl ConnectionRegistry {
    pub fn new(authority: Arc<dyn BackendAuthority>) -> Self {
        Self {
            authority,
            stale_after: Duration::seconds(DEFAULT_STALE_AFTER_SECS),
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Connections owned by `user`. Records for other users are dropped even
    /// if the authority returns them.
    pub async fn list(&self, user: Option<&SessionUser>) -> Result<Vec<Connection>, ConnectError> {
        let user = require_user(user)?;
        let all = self.authority.list_connections(user).await?;
        let total = all.len();

        let mut owned: Vec<Connection> = all.into_iter().filter(|c| c.user_id == user.id).collect();
        if owned.len() != total {
            tracing::warn!(
                "Authority returned {} connection(s) not owned by user {}",
                total - owned.len(),
                user.id
            );
        }

        owned.sort_by(|a, b| {
            a.platform
                .as_str()
                .cmp(b.platform.as_str())
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(owned)
    }

    /// [`ConnectionRegistry::list`] rendered for display.
    pub async fn summaries(
        &self,
        user: Option<&SessionUser>,
    ) -> Result<Vec<ConnectionSummary>, ConnectError> {
        let now = Utc::now();
        Ok(self
            .list(user)
            .await?
            .iter()
            .map(|c| self.summarize(c, now))
            .collect())
    }

    pub fn summary(&self, connection: &Connection) -> ConnectionSummary {
        self.summarize(connection, Utc::now())
    }

    fn summarize(&self, connection: &Connection, now: chrono::DateTime<Utc>) -> ConnectionSummary {
        connection.summary(now, self.stale_after)
    }

    /// Record the outcome of a successful exchange. The newest connection
    /// wins: any other active connection of the same platform is disconnected.
    pub async fn upsert(
        &self,
        user: Option<&SessionUser>,
        connection: Connection,
    ) -> Result<Connection, ConnectError> {
        let user = require_user(user)?;
        if connection.user_id != user.id {
            return Err(ConnectError::ExchangeFailed(format!(
                "Connection {} does not belong to the current user",
                connection.id
            ))
            .log());
        }
        if !connection.is_active {
            return Ok(connection);
        }

        let superseded: Vec<Connection> = self
            .list(Some(user))
            .await?
            .into_iter()
            .filter(|c| c.platform == connection.platform && c.is_active && c.id != connection.id)
            .collect();

        for old in superseded {
            tracing::info!(
                "Superseding {} connection {} with {}",
                old.platform,
                old.id,
                connection.id
            );
            match self.authority.delete_connection(user, &old.id).await {
                Ok(()) | Err(ConnectError::ConnectionNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(connection)
    }

    /// Remove a connection. Removing something that is already gone succeeds.
    pub async fn disconnect(
        &self,
        user: Option<&SessionUser>,
        connection_id: &str,
    ) -> Result<(), ConnectError> {
        let user = require_user(user)?;

        match self.find_owned(user, connection_id).await {
            Ok(_) => {}
            Err(ConnectError::ConnectionNotFound(_)) => {
                tracing::debug!("Connection {} already gone", connection_id);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        match self.authority.delete_connection(user, connection_id).await {
            Ok(()) | Err(ConnectError::ConnectionNotFound(_)) => {
                tracing::info!("Disconnected {} for user {}", connection_id, user.id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Obtain a new access token for the connection.
    pub async fn refresh(
        &self,
        user: Option<&SessionUser>,
        connection_id: &str,
    ) -> Result<Connection, ConnectError> {
        let user = require_user(user)?;
        let connection = self.find_owned(user, connection_id).await?;
        self.refresh_owned(user, &connection).await
    }

    /// Re-read profile metadata from the platform. Tokens are untouched.
    pub async fn sync(
        &self,
        user: Option<&SessionUser>,
        connection_id: &str,
    ) -> Result<Connection, ConnectError> {
        let user = require_user(user)?;
        let connection = self.find_owned(user, connection_id).await?;
        self.sync_owned(user, &connection).await
    }

    /// Recent posts and their metrics, as the platform reports them.
    pub async fn posts(
        &self,
        user: Option<&SessionUser>,
        connection_id: &str,
    ) -> Result<Vec<PlatformPost>, ConnectError> {
        let user = require_user(user)?;
        let connection = self.find_owned(user, connection_id).await?;
        self.authority.connection_posts(user, &connection.id).await
    }

    pub(crate) async fn refresh_owned(
        &self,
        user: &SessionUser,
        connection: &Connection,
    ) -> Result<Connection, ConnectError> {
        if connection.refresh_token.is_none() {
            return Err(ConnectError::RefreshFailed(RefreshFailure::NoRefreshToken).log());
        }

        let refreshed = self
            .authority
            .refresh_connection(user, &connection.id)
            .await?;
        tracing::info!("Refreshed token for {} connection {}", connection.platform, connection.id);
        Ok(refreshed)
    }

    pub(crate) async fn sync_owned(
        &self,
        user: &SessionUser,
        connection: &Connection,
    ) -> Result<Connection, ConnectError> {
        let synced = self.authority.sync_connection(user, &connection.id).await?;
        tracing::info!("Synced {} connection {}", connection.platform, connection.id);
        Ok(synced)
    }

    async fn find_owned(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Connection, ConnectError> {
        self.list(Some(user))
            .await?
            .into_iter()
            .find(|c| c.id == connection_id)
            .ok_or_else(|| ConnectError::ConnectionNotFound(connection_id.to_string()))
    }
}
