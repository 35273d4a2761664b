use crate::authority::CodeExchangeRequest;
use crate::connection::Connection;
use crate::errors::ConnectError;
use crate::platform::Platform;
use crate::service::SocialConnect;
use crate::session::{SessionUser, require_user};
use crate::utils::constant_time_eq;

use super::types::{CallbackParams, FlowContextId};

impl SocialConnect {
    /// Finish an attempt started by [`SocialConnect::begin_connection`].
    ///
    /// The stored attempt is consumed before anything else is checked, so a
    /// callback can be processed at most once whatever its outcome. All
    /// validation happens locally; the authority is only called once the
    /// callback is known to belong to this context and platform.
    pub async fn complete_connection(
        &self,
        user: Option<&SessionUser>,
        ctx: Option<&FlowContextId>,
        platform: Platform,
        params: &CallbackParams,
    ) -> Result<Connection, ConnectError> {
        let stored = match ctx {
            Some(ctx) => match self.flows().take(ctx, platform).await? {
                Some(stored) => Some(stored),
                // A state issued for another platform still burns that attempt
                None => match non_empty(&params.state) {
                    Some(state) => self.flows().take_by_nonce(ctx, state).await?,
                    None => None,
                },
            },
            None => None,
        };

        if let Some(error) = non_empty(&params.error) {
            let reason = non_empty(&params.error_description).unwrap_or(error);
            return Err(ConnectError::AuthorizationDenied(reason.to_string()).log());
        }

        let (code, state) = match (non_empty(&params.code), non_empty(&params.state)) {
            (Some(code), Some(state)) => (code, state),
            (code, state) => {
                let missing: Vec<&str> = [("code", code), ("state", state)]
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(name, _)| name)
                    .collect();
                return Err(ConnectError::MissingParameters(missing.join(", ")).log());
            }
        };

        let Some(stored) = stored else {
            return Err(ConnectError::NoMatchingFlow(platform).log());
        };

        if !constant_time_eq(&stored.nonce, state) || stored.platform != platform {
            return Err(ConnectError::StateMismatch.log());
        }

        let user = require_user(user)?;

        let request = CodeExchangeRequest {
            platform,
            code: code.to_string(),
            redirect_uri: self.config().callback_uri(platform),
            code_verifier: stored.code_verifier,
        };
        let connection = self.authority().exchange_code(user, &request).await?;

        if connection.platform != platform || connection.user_id != user.id {
            return Err(ConnectError::ExchangeFailed(format!(
                "Authority returned a {} connection for another account",
                connection.platform
            ))
            .log());
        }

        tracing::info!(
            "Connected {} account {} for user {}",
            platform,
            connection.platform_username,
            user.id
        );

        self.registry().upsert(Some(user), connection).await
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
