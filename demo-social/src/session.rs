use async_trait::async_trait;
use http::HeaderMap;
use std::env;
use std::time::Duration;

use social_connect::SessionUser;
use social_connect_axum::SessionResolver;

/// Single-user sessions for the demo: every request belongs to the user
/// configured by `DEMO_USER_ID` and `DEMO_USER_CREDENTIAL`.
///
/// A real application resolves the user from its own session cookie.
pub(crate) struct DemoSessions {
    user: Option<SessionUser>,
}

impl DemoSessions {
    pub(crate) fn from_env() -> Self {
        let user = match (env::var("DEMO_USER_ID"), env::var("DEMO_USER_CREDENTIAL")) {
            (Ok(id), Ok(credential)) => Some(SessionUser::new(id, credential)),
            _ => {
                tracing::warn!("DEMO_USER_ID/DEMO_USER_CREDENTIAL not set, all requests are anonymous");
                None
            }
        };
        Self { user }
    }

    pub(crate) fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }
}

#[async_trait]
impl SessionResolver for DemoSessions {
    async fn resolve(&self, _headers: &HeaderMap) -> Option<SessionUser> {
        self.user.clone()
    }
}

/// How often the background maintenance pass runs.
/// Default: 300 seconds
pub(crate) fn maintenance_period() -> Duration {
    let secs = env::var("DEMO_MAINTENANCE_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|s| *s > 0)
        .unwrap_or(300);
    Duration::from_secs(secs)
}
