//! Combined router for the connection endpoints

use axum::Router;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::session::SocialState;

/// Create a router for all connection endpoints
///
/// Mount it at the configured route prefix (`SOCIAL_ROUTE_PREFIX`, default
/// `/auth`) so the callback address matches what the platforms expect:
/// - {prefix}/connect/{platform}
/// - {prefix}/callback/{platform}
/// - {prefix}/connections/...
pub fn social_connect_router(state: SocialState) -> Router {
    social_connect_router_no_trace(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`social_connect_router`] without the HTTP tracing middleware.
pub fn social_connect_router_no_trace(state: SocialState) -> Router {
    Router::new()
        .merge(super::callback::router())
        .merge(super::connections::router())
        .with_state(state)
}
