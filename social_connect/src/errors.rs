//! Error taxonomy shared by the flow, registry and scheduler.

use serde::Serialize;
use thiserror::Error;

use crate::platform::Platform;
use crate::storage::StorageError;
use crate::utils::UtilError;

/// Why a token refresh did not produce a fresh token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// The connection never received a refresh token from the platform.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The authority or the platform refused the refresh.
    #[error("{0}")]
    Rejected(String),
}

/// What the user can do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Remedy {
    /// Transient, the same action may succeed later.
    Retry,
    /// Start the connection flow again from the beginning.
    Restart,
    /// The platform has to be set up on the backend first.
    Reconfigure,
    /// The user's own session is gone.
    Relogin,
    /// The stored credentials are unusable, the platform must be reconnected.
    Reconnect,
    /// Local view is out of date, reload the connection list.
    Reload,
}

/// Errors reported by connection operations
///
/// Every variant is a distinct outcome the UI can branch on. Messages coming
/// from the backend authority are carried verbatim.
#[derive(Debug, Error, Clone)]
pub enum ConnectError {
    /// Platform not set up on the backend authority
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend authority unreachable or answered garbage
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform reported an error on the redirect (user declined, etc.)
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Callback without code or state
    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    /// No in-flight attempt for this platform in this browser context
    #[error("No matching connection attempt for {0}")]
    NoMatchingFlow(Platform),

    /// Callback state does not belong to the stored attempt
    #[error("State mismatch")]
    StateMismatch,

    /// Authorization code could not be exchanged for tokens
    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(RefreshFailure),

    #[error("Sync failed: {0}")]
    SyncFailed(String),

    /// No current user session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The connection does not exist or belongs to someone else
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Utils error: {0}")]
    Utils(UtilError),
}

impl ConnectError {
    /// Stable machine-readable identifier of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Transport(_) => "transport_error",
            Self::AuthorizationDenied(_) => "authorization_denied",
            Self::MissingParameters(_) => "missing_parameters",
            Self::NoMatchingFlow(_) => "no_matching_flow",
            Self::StateMismatch => "state_mismatch",
            Self::ExchangeFailed(_) => "exchange_failed",
            Self::RefreshFailed(_) => "refresh_failed",
            Self::SyncFailed(_) => "sync_failed",
            Self::NotAuthenticated => "not_authenticated",
            Self::ConnectionNotFound(_) => "connection_not_found",
            Self::Storage(_) => "storage_error",
            Self::Utils(_) => "internal_error",
        }
    }

    pub fn remedy(&self) -> Remedy {
        match self {
            Self::Configuration(_) => Remedy::Reconfigure,
            Self::Transport(_) | Self::SyncFailed(_) | Self::Storage(_) | Self::Utils(_) => {
                Remedy::Retry
            }
            Self::AuthorizationDenied(_)
            | Self::MissingParameters(_)
            | Self::NoMatchingFlow(_)
            | Self::StateMismatch
            | Self::ExchangeFailed(_) => Remedy::Restart,
            Self::RefreshFailed(_) => Remedy::Reconnect,
            Self::NotAuthenticated => Remedy::Relogin,
            Self::ConnectionNotFound(_) => Remedy::Reload,
        }
    }

    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::AuthorizationDenied(_) | Self::NotAuthenticated => {
                tracing::warn!("{}", self)
            }
            _ => tracing::error!("{}", self),
        }
        self
    }
}

impl From<StorageError> for ConnectError {
    fn from(err: StorageError) -> Self {
        let error = Self::Storage(err);
        tracing::error!("{}", error);
        error
    }
}

impl From<UtilError> for ConnectError {
    fn from(err: UtilError) -> Self {
        let error = Self::Utils(err);
        tracing::error!("{}", error);
        error
    }
}
