use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Serialize;

use social_connect::{
    CallbackParams, ConnectError, Connection, ConnectionSummary, Platform, Remedy, SessionUser,
    SocialConnect,
};

use crate::config::PageConfig;
use crate::error::{ErrorResponse, IntoResponseError, status_for};
use crate::session::{CurrentUser, SocialState};

pub(super) fn router() -> Router<SocialState> {
    Router::new()
        .route("/callback.js", get(serve_callback_js))
        .route("/connect/{platform}", get(connect))
        .route(
            "/callback/{platform}",
            get(callback_page).post(complete_callback),
        )
}

pub(crate) fn parse_platform(platform: &str) -> Result<Platform, ErrorResponse> {
    platform
        .parse::<Platform>()
        .map_err(|e| ErrorResponse::not_found(e.to_string()))
}

async fn serve_callback_js() -> Result<Response, ErrorResponse> {
    let js_content = include_str!("../static/callback.js");
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/javascript")
        .body(js_content.to_string().into())
        .into_response_error()
}

/// Start a connection: record the attempt and send the browser to the
/// platform's consent screen.
async fn connect(
    State(state): State<SocialState>,
    CurrentUser(user): CurrentUser,
    Path(platform): Path<String>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Redirect), ErrorResponse> {
    let platform = parse_platform(&platform)?;
    let service = &state.service;

    let ctx = service.flow_context_or_new(&headers).into_response_error()?;
    let auth_url = service
        .begin_connection(user.as_ref(), &ctx, platform)
        .await
        .into_response_error()?;
    let cookie_headers = service.flow_cookie_headers(&ctx).into_response_error()?;

    Ok((cookie_headers, Redirect::to(&auth_url)))
}

#[derive(Template)]
#[template(path = "callback.j2")]
struct CallbackTemplate<'a> {
    platform: &'a str,
    platform_name: &'a str,
    script_url: String,
}

/// Landing page for the platform redirect. It shows a processing state and
/// its script posts the query parameters back for validation.
async fn callback_page(
    State(state): State<SocialState>,
    Path(platform): Path<String>,
) -> Result<Html<String>, ErrorResponse> {
    let platform = parse_platform(&platform)?;
    let template = CallbackTemplate {
        platform: platform.as_str(),
        platform_name: platform.display_name(),
        script_url: format!("{}/callback.js", state.service.config().route_prefix()),
    };
    Ok(Html(template.render().into_response_error()?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Success,
    Error,
}

/// Result of a callback as shown on the callback page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
    pub status: CallbackStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy: Option<Remedy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionSummary>,
    pub redirect_to: String,
    pub delay_ms: u64,
}

impl CallbackOutcome {
    fn success(summary: ConnectionSummary, pages: &PageConfig) -> Self {
        Self {
            status: CallbackStatus::Success,
            message: format!(
                "Connected {} account @{}",
                summary.platform.display_name(),
                summary.platform_username
            ),
            kind: None,
            remedy: None,
            connection: Some(summary),
            redirect_to: pages.manage_url.clone(),
            delay_ms: pages.success_delay_ms,
        }
    }

    fn failure(error: &ConnectError, pages: &PageConfig) -> Self {
        Self {
            status: CallbackStatus::Error,
            message: user_message(error),
            kind: Some(error.kind()),
            remedy: Some(error.remedy()),
            connection: None,
            redirect_to: pages.manage_url.clone(),
            delay_ms: pages.error_delay_ms,
        }
    }
}

fn user_message(error: &ConnectError) -> String {
    match error {
        ConnectError::AuthorizationDenied(reason) => {
            format!("Authorization was not granted: {reason}")
        }
        ConnectError::MissingParameters(_) => {
            "The platform response was incomplete. Please try connecting again.".to_string()
        }
        ConnectError::NoMatchingFlow(_) | ConnectError::StateMismatch => {
            "This connection attempt is no longer valid. Please try connecting again.".to_string()
        }
        ConnectError::ExchangeFailed(reason) => {
            format!("Could not complete the connection: {reason}")
        }
        ConnectError::NotAuthenticated => {
            "Your session has expired. Please sign in again.".to_string()
        }
        other => other.to_string(),
    }
}

/// Validate the callback parameters and exchange the code.
async fn complete_callback(
    State(state): State<SocialState>,
    CurrentUser(user): CurrentUser,
    Path(platform): Path<String>,
    headers: HeaderMap,
    Json(params): Json<CallbackParams>,
) -> Response {
    let service = &state.service;
    let result = validate_and_exchange(service, user.as_ref(), &platform, &headers, &params).await;

    match result {
        Ok(connection) => {
            let summary = service.registry().summary(&connection);
            (
                StatusCode::OK,
                Json(CallbackOutcome::success(summary, &state.pages)),
            )
                .into_response()
        }
        Err(e) => (
            status_for(&e),
            Json(CallbackOutcome::failure(&e, &state.pages)),
        )
            .into_response(),
    }
}

async fn validate_and_exchange(
    service: &SocialConnect,
    user: Option<&SessionUser>,
    platform: &str,
    headers: &HeaderMap,
    params: &CallbackParams,
) -> Result<Connection, ConnectError> {
    let platform = platform
        .parse::<Platform>()
        .map_err(|e| ConnectError::MissingParameters(e.to_string()))?;
    let ctx = service.flow_context(headers)?;
    service
        .complete_connection(user, ctx.as_ref(), platform, params)
        .await
}
