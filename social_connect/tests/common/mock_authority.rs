//! Axum-based mock backend authority and platform consent screen.
//!
//! Each test starts its own server on an ephemeral port, so tests don't share
//! state and can run in parallel.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConnection {
    pub id: String,
    pub user_id: String,
    pub platform: String,
    pub platform_user_id: String,
    pub platform_username: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub followers_count: Option<u64>,
    pub profile_url: Option<String>,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct PendingAuthorization {
    platform: String,
    redirect_uri: String,
    code_verifier: String,
}

#[derive(Default)]
struct Inner {
    connections: Vec<StoredConnection>,
    pending: HashMap<String, PendingAuthorization>,
    codes: HashMap<String, String>,
    unconfigured: HashSet<String>,
    deny_consent: bool,
}

#[derive(Clone, Default)]
pub struct MockAuthorityState {
    inner: Arc<Mutex<Inner>>,
    base_url: Arc<Mutex<String>>,
    pub exchange_calls: Arc<AtomicUsize>,
    pub refresh_calls: Arc<AtomicUsize>,
}

pub struct MockAuthorityServer {
    pub base_url: String,
    pub state: MockAuthorityState,
}

impl MockAuthorityServer {
    pub async fn start() -> Self {
        let state = MockAuthorityState::default();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock authority");
        let base_url = format!(
            "http://{}",
            listener.local_addr().expect("No local address")
        );
        *state.base_url.lock().unwrap() = base_url.clone();

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock authority server failed");
        });

        Self { base_url, state }
    }

    pub fn unconfigure(&self, platform: &str) {
        self.state
            .inner
            .lock()
            .unwrap()
            .unconfigured
            .insert(platform.to_string());
    }

    pub fn deny_consent(&self) {
        self.state.inner.lock().unwrap().deny_consent = true;
    }

    pub fn insert(&self, connection: StoredConnection) {
        self.state.inner.lock().unwrap().connections.push(connection);
    }

    pub fn connections(&self) -> Vec<StoredConnection> {
        self.state.inner.lock().unwrap().connections.clone()
    }

    pub fn exchange_calls(&self) -> usize {
        self.state.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }
}

pub fn stored_connection(id: &str, user_id: &str, platform: &str) -> StoredConnection {
    let now = Utc::now();
    StoredConnection {
        id: id.to_string(),
        user_id: user_id.to_string(),
        platform: platform.to_string(),
        platform_user_id: format!("{platform}-{id}"),
        platform_username: format!("{id}_handle"),
        access_token: format!("{platform}-access-{}", Uuid::new_v4().simple()),
        refresh_token: Some(format!("{platform}-refresh-{}", Uuid::new_v4().simple())),
        token_expires_at: Some(now + Duration::hours(2)),
        followers_count: Some(100),
        profile_url: Some(format!("https://{platform}.example/{id}")),
        is_active: true,
        last_synced_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn router(state: MockAuthorityState) -> Router {
    Router::new()
        .route("/social/oauth/{platform}/authorize", get(authorize))
        .route("/social/oauth/{platform}/callback", post(exchange))
        .route("/social/connections", get(list))
        .route("/social/connections/{id}", delete(remove))
        .route("/social/connections/{id}/refresh", post(refresh))
        .route("/social/connections/{id}/sync", post(sync))
        .route("/social/connections/{id}/posts", get(posts))
        .route("/platform/{platform}/consent", get(consent))
        .with_state(state)
}

/// The bearer credential `bearer-{user}` authenticates `{user}`.
fn authenticated_user(headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer bearer-"))
        .map(str::to_string)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Authentication required"))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeQuery {
    redirect_uri: String,
    state: String,
}

async fn authorize(
    State(state): State<MockAuthorityState>,
    Path(platform): Path<String>,
    headers: HeaderMap,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    if let Err(response) = authenticated_user(&headers) {
        return response;
    }

    let mut inner = state.inner.lock().unwrap();
    if inner.unconfigured.contains(&platform) {
        return error(
            StatusCode::BAD_REQUEST,
            &format!("{platform} OAuth is not configured"),
        );
    }

    let code_verifier = format!("verifier-{}", Uuid::new_v4().simple());
    inner.pending.insert(
        query.state.clone(),
        PendingAuthorization {
            platform: platform.clone(),
            redirect_uri: query.redirect_uri.clone(),
            code_verifier: code_verifier.clone(),
        },
    );

    let base_url = state.base_url.lock().unwrap().clone();
    let mut url = url::Url::parse(&format!("{base_url}/platform/{platform}/consent"))
        .expect("Invalid consent URL");
    url.query_pairs_mut()
        .append_pair("state", &query.state)
        .append_pair("redirect_uri", &query.redirect_uri);

    Json(json!({
        "authorizationUrl": url.to_string(),
        "codeVerifier": code_verifier,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct ConsentQuery {
    state: String,
    redirect_uri: String,
}

/// Stands in for the platform's consent screen: the user either approves
/// and is sent back with a code, or declines.
async fn consent(
    State(state): State<MockAuthorityState>,
    Path(_platform): Path<String>,
    Query(query): Query<ConsentQuery>,
) -> Response {
    let mut inner = state.inner.lock().unwrap();
    let mut url = url::Url::parse(&query.redirect_uri).expect("Invalid redirect_uri");

    if inner.deny_consent {
        url.query_pairs_mut()
            .append_pair("error", "access_denied")
            .append_pair("error_description", "The user denied the request")
            .append_pair("state", &query.state);
    } else {
        let code = format!("code-{}", Uuid::new_v4().simple());
        inner.codes.insert(code.clone(), query.state.clone());
        url.query_pairs_mut()
            .append_pair("code", &code)
            .append_pair("state", &query.state);
    }

    Redirect::to(url.as_str()).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeBody {
    platform: String,
    code: String,
    redirect_uri: String,
    code_verifier: Option<String>,
}

async fn exchange(
    State(state): State<MockAuthorityState>,
    Path(platform): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ExchangeBody>,
) -> Response {
    let user = match authenticated_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    state.exchange_calls.fetch_add(1, Ordering::SeqCst);

    let mut inner = state.inner.lock().unwrap();
    let issued_for = inner.codes.remove(&body.code);
    let Some(pending) = issued_for.and_then(|s| inner.pending.remove(&s)) else {
        return error(StatusCode::BAD_REQUEST, "invalid_grant: unknown or used code");
    };

    if pending.platform != platform
        || body.platform != platform
        || pending.redirect_uri != body.redirect_uri
        || body.code_verifier.as_deref() != Some(pending.code_verifier.as_str())
    {
        return error(StatusCode::BAD_REQUEST, "invalid_grant: request mismatch");
    }

    let id = format!("conn-{}", Uuid::new_v4().simple());
    let connection = stored_connection(&id, &user, &platform);
    inner.connections.push(connection.clone());
    Json(connection).into_response()
}

async fn list(State(state): State<MockAuthorityState>, headers: HeaderMap) -> Response {
    let user = match authenticated_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let inner = state.inner.lock().unwrap();
    let owned: Vec<&StoredConnection> = inner
        .connections
        .iter()
        .filter(|c| c.user_id == user)
        .collect();
    Json(owned).into_response()
}

async fn remove(
    State(state): State<MockAuthorityState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticated_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut inner = state.inner.lock().unwrap();
    let before = inner.connections.len();
    inner
        .connections
        .retain(|c| !(c.id == id && c.user_id == user));
    if inner.connections.len() == before {
        return error(StatusCode::NOT_FOUND, "Connection not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

fn update_owned(
    state: &MockAuthorityState,
    headers: &HeaderMap,
    id: &str,
    apply: impl FnOnce(&mut StoredConnection) -> Result<(), Response>,
) -> Response {
    let user = match authenticated_user(headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut inner = state.inner.lock().unwrap();
    let Some(conn) = inner
        .connections
        .iter_mut()
        .find(|c| c.id == id && c.user_id == user)
    else {
        return error(StatusCode::NOT_FOUND, "Connection not found");
    };
    if let Err(response) = apply(conn) {
        return response;
    }
    conn.updated_at = Utc::now();
    Json(conn.clone()).into_response()
}

async fn refresh(
    State(state): State<MockAuthorityState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    update_owned(&state, &headers, &id, |conn| {
        if conn.refresh_token.is_none() {
            return Err(error(StatusCode::BAD_REQUEST, "No refresh token"));
        }
        conn.access_token = format!("{}-access-{}", conn.platform, Uuid::new_v4().simple());
        conn.token_expires_at = Some(Utc::now() + Duration::hours(2));
        Ok(())
    })
}

async fn sync(
    State(state): State<MockAuthorityState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    update_owned(&state, &headers, &id, |conn| {
        if conn.platform == "tiktok" {
            return Err(error(StatusCode::BAD_GATEWAY, "TikTok API unavailable"));
        }
        conn.followers_count = conn.followers_count.map(|n| n + 5);
        conn.last_synced_at = Some(Utc::now());
        Ok(())
    })
}

async fn posts(
    State(state): State<MockAuthorityState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticated_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let inner = state.inner.lock().unwrap();
    if !inner
        .connections
        .iter()
        .any(|c| c.id == id && c.user_id == user)
    {
        return error(StatusCode::NOT_FOUND, "Connection not found");
    }
    Json(json!([
        {
            "id": format!("{id}-p1"),
            "text": "First post",
            "publishedAt": "2024-05-01T12:00:00Z",
            "metrics": { "likes": 12, "reposts": 3 }
        },
        {
            "id": format!("{id}-p2"),
            "metrics": { "likes": 0 }
        }
    ]))
    .into_response()
}
