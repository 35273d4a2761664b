//! Periodic token refresh and metadata sync for one user's connections.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::connection::{Connection, ConnectionRegistry};
use crate::errors::ConnectError;
use crate::session::{SessionUser, require_user};

/// When maintenance kicks in.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    /// Refresh tokens expiring within this margin.
    pub refresh_margin: Duration,
    /// Sync metadata last synced longer ago than this.
    pub sync_interval: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            refresh_margin: Duration::seconds(300),
            sync_interval: Duration::hours(1),
        }
    }
}

impl SyncPolicy {
    fn is_expiring(&self, connection: &Connection, now: DateTime<Utc>) -> bool {
        connection
            .token_expires_at
            .is_some_and(|at| at - now <= self.refresh_margin)
    }

    fn needs_sync(&self, connection: &Connection, now: DateTime<Utc>) -> bool {
        connection.is_stale(now, self.sync_interval)
    }
}

/// What one maintenance pass did. A failure on one connection doesn't stop
/// the others.
#[derive(Debug, Default)]
pub struct MaintenanceReport {
    pub refreshed: Vec<String>,
    pub synced: Vec<String>,
    /// Expiring connections without a refresh token. Only reconnecting them
    /// helps, so no refresh is attempted.
    pub needs_reconnect: Vec<String>,
    pub failures: Vec<(String, ConnectError)>,
}

impl MaintenanceReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone)]
pub struct SyncScheduler {
    registry: ConnectionRegistry,
    policy: SyncPolicy,
}

impl SyncScheduler {
    pub fn new(registry: ConnectionRegistry, policy: SyncPolicy) -> Self {
        Self { registry, policy }
    }

    /// Refresh and sync whatever is due for `user`, once.
    ///
    /// Refresh and sync are independent: a connection whose refresh failed is
    /// still synced if it is due.
    pub async fn run_once(
        &self,
        user: Option<&SessionUser>,
    ) -> Result<MaintenanceReport, ConnectError> {
        let user = require_user(user)?;
        let now = Utc::now();
        let mut report = MaintenanceReport::default();

        for connection in self.registry.list(Some(user)).await? {
            if !connection.is_active {
                continue;
            }

            if self.policy.is_expiring(&connection, now) {
                if connection.refresh_token.is_none() {
                    report.needs_reconnect.push(connection.id.clone());
                } else {
                    match self.registry.refresh_owned(user, &connection).await {
                        Ok(_) => report.refreshed.push(connection.id.clone()),
                        Err(e) => report.failures.push((connection.id.clone(), e)),
                    }
                }
            }

            if self.policy.needs_sync(&connection, now) {
                match self.registry.sync_owned(user, &connection).await {
                    Ok(_) => report.synced.push(connection.id.clone()),
                    Err(e) => report.failures.push((connection.id.clone(), e)),
                }
            }
        }

        tracing::debug!(
            "Maintenance for user {}: {} refreshed, {} synced, {} to reconnect, {} failed",
            user.id,
            report.refreshed.len(),
            report.synced.len(),
            report.needs_reconnect.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Run [`SyncScheduler::run_once`] every `period` until the handle is
    /// aborted.
    pub fn spawn(self: Arc<Self>, user: SessionUser, period: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match self.run_once(Some(&user)).await {
                    Ok(report) => {
                        for (id, error) in &report.failures {
                            tracing::warn!("Maintenance of connection {} failed: {}", id, error);
                        }
                    }
                    Err(e) => tracing::warn!("Maintenance pass for {} failed: {}", user.id, e),
                }
            }
        })
    }
}
