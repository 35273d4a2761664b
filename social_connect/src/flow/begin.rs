use chrono::{Duration, Utc};
use url::Url;

use crate::authority::AuthorizationUrlRequest;
use crate::errors::ConnectError;
use crate::platform::Platform;
use crate::service::SocialConnect;
use crate::session::{SessionUser, require_user};
use crate::utils::gen_random_string;

use super::types::{FlowContextId, FlowState};

impl SocialConnect {
    /// Start linking `platform` for `user` from the browser context `ctx`.
    ///
    /// Returns the platform authorization URL the browser should be sent to.
    /// The attempt is recorded only after the authority has answered, so a
    /// failed call leaves no stale state behind.
    pub async fn begin_connection(
        &self,
        user: Option<&SessionUser>,
        ctx: &FlowContextId,
        platform: Platform,
    ) -> Result<String, ConnectError> {
        let user = require_user(user)?;

        let nonce = gen_random_string(32)?;
        let request = AuthorizationUrlRequest {
            platform,
            redirect_uri: self.config().callback_uri(platform),
            state: nonce.clone(),
        };

        let response = self.authority().authorization_url(user, &request).await?;
        validate_authorization_url(&response.authorization_url)?;

        let ttl = i64::try_from(self.flows().ttl()).unwrap_or(i64::MAX);
        let state = FlowState {
            nonce,
            platform,
            code_verifier: response.code_verifier,
            expires_at: Utc::now() + Duration::seconds(ttl),
        };
        self.flows().put(ctx, &state).await?;

        tracing::info!("Starting {} connection for user {}", platform, user.id);
        Ok(response.authorization_url)
    }
}

fn validate_authorization_url(url: &str) -> Result<(), ConnectError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "https" | "http") => Ok(()),
        _ => Err(ConnectError::Configuration(format!(
            "Authority returned an invalid authorization URL: {url}"
        ))
        .log()),
    }
}
