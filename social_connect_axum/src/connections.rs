use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};

use social_connect::{ConnectionSummary, PlatformPost};

use crate::error::{ErrorResponse, IntoResponseError};
use crate::session::{CurrentUser, SocialState};

pub(super) fn router() -> Router<SocialState> {
    Router::new()
        .route("/connections", get(list_connections))
        .route("/connections/{id}", delete(disconnect))
        .route("/connections/{id}/refresh", post(refresh))
        .route("/connections/{id}/sync", post(sync))
        .route("/connections/{id}/posts", get(posts))
}

async fn list_connections(
    State(state): State<SocialState>,
    user: CurrentUser,
) -> Result<Json<Vec<ConnectionSummary>>, ErrorResponse> {
    let summaries = state
        .service
        .registry()
        .summaries(user.user())
        .await
        .into_response_error()?;
    Ok(Json(summaries))
}

async fn disconnect(
    State(state): State<SocialState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    state
        .service
        .registry()
        .disconnect(user.user(), &id)
        .await
        .into_response_error()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh(
    State(state): State<SocialState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ConnectionSummary>, ErrorResponse> {
    let registry = state.service.registry();
    let connection = registry
        .refresh(user.user(), &id)
        .await
        .into_response_error()?;
    Ok(Json(registry.summary(&connection)))
}

async fn sync(
    State(state): State<SocialState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ConnectionSummary>, ErrorResponse> {
    let registry = state.service.registry();
    let connection = registry
        .sync(user.user(), &id)
        .await
        .into_response_error()?;
    Ok(Json(registry.summary(&connection)))
}

async fn posts(
    State(state): State<SocialState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PlatformPost>>, ErrorResponse> {
    let posts = state
        .service
        .registry()
        .posts(user.user(), &id)
        .await
        .into_response_error()?;
    Ok(Json(posts))
}
