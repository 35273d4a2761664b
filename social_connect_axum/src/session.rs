use async_trait::async_trait;
use axum::extract::FromRequestParts;
use http::HeaderMap;
use http::request::Parts;
use std::convert::Infallible;
use std::sync::Arc;

use social_connect::{SessionUser, SocialConnect};

use crate::config::PageConfig;

/// Looks up the application user for a request.
///
/// Login is the host application's business; it plugs its session handling
/// in here.
#[async_trait]
pub trait SessionResolver: Send + Sync + 'static {
    async fn resolve(&self, headers: &HeaderMap) -> Option<SessionUser>;
}

/// Shared state for the connection routes.
#[derive(Clone)]
pub struct SocialState {
    pub service: Arc<SocialConnect>,
    pub sessions: Arc<dyn SessionResolver>,
    pub pages: PageConfig,
}

impl SocialState {
    pub fn new(service: Arc<SocialConnect>, sessions: Arc<dyn SessionResolver>) -> Self {
        Self {
            service,
            sessions,
            pages: PageConfig::from_env(),
        }
    }

    pub fn with_pages(mut self, pages: PageConfig) -> Self {
        self.pages = pages;
        self
    }
}

/// The current user, if the request carries a session.
///
/// Never rejects: operations decide themselves whether a user is required
/// and report `NotAuthenticated` otherwise.
pub struct CurrentUser(pub Option<SessionUser>);

impl CurrentUser {
    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}

impl FromRequestParts<SocialState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SocialState,
    ) -> Result<Self, Self::Rejection> {
        let user = state.sessions.resolve(&parts.headers).await;
        if user.is_none() {
            tracing::debug!("No session user for {}", parts.uri.path());
        }
        Ok(CurrentUser(user))
    }
}
