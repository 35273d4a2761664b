use askama::Template;
use axum::{extract::State, http::StatusCode, response::Html};
use std::sync::Arc;

use social_connect::Platform;
use social_connect_axum::SOCIAL_ROUTE_PREFIX;

use crate::session::DemoSessions;

struct PlatformLink {
    id: &'static str,
    name: &'static str,
}

#[derive(Template)]
#[template(path = "index.j2")]
struct IndexTemplate<'a> {
    user_id: Option<&'a str>,
    platforms: Vec<PlatformLink>,
    social_route_prefix: &'a str,
}

pub(crate) async fn index(
    State(sessions): State<Arc<DemoSessions>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let template = IndexTemplate {
        user_id: sessions.user().map(|u| u.id.as_str()),
        platforms: Platform::ALL
            .iter()
            .map(|p| PlatformLink {
                id: p.as_str(),
                name: p.display_name(),
            })
            .collect(),
        social_route_prefix: SOCIAL_ROUTE_PREFIX.as_str(),
    };
    let html = Html(
        template
            .render()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?,
    );
    Ok(html)
}
