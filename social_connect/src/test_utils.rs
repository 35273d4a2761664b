//! In-process authority double for unit tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::SecretString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::authority::{
    AuthorizationUrlRequest, AuthorizationUrlResponse, BackendAuthority, CodeExchangeRequest,
};
use crate::config::ConnectConfig;
use crate::connection::{Connection, PlatformPost};
use crate::errors::ConnectError;
use crate::platform::Platform;
use crate::service::SocialConnect;
use crate::session::SessionUser;
use crate::storage::in_memory_cache_store;

pub(crate) fn test_user(id: &str) -> SessionUser {
    SessionUser::new(id, format!("bearer-{id}"))
}

pub(crate) fn test_service(authority: Arc<MockAuthority>) -> SocialConnect {
    let config = ConnectConfig::new("https://app.example.com").unwrap();
    SocialConnect::new(config, authority, in_memory_cache_store())
}

pub(crate) fn connection(id: &str, user_id: &str, platform: Platform) -> Connection {
    let now = Utc::now();
    Connection {
        id: id.to_string(),
        user_id: user_id.to_string(),
        platform,
        platform_user_id: format!("{platform}-{id}"),
        platform_username: format!("{id}_handle"),
        access_token: SecretString::new(format!("access-{id}-token")),
        refresh_token: Some(SecretString::new(format!("refresh-{id}-token"))),
        token_expires_at: Some(now + Duration::hours(2)),
        followers_count: Some(10),
        profile_url: None,
        is_active: true,
        last_synced_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct Failures {
    authorize: Option<ConnectError>,
    exchange: Option<ConnectError>,
    refresh: Option<ConnectError>,
    list: Option<ConnectError>,
    delete: Option<ConnectError>,
    sync: Option<ConnectError>,
}

#[derive(Default)]
pub(crate) struct MockAuthority {
    connections: Mutex<Vec<Connection>>,
    failures: Mutex<Failures>,
    last_authorize: Mutex<Option<AuthorizationUrlRequest>>,
    last_exchange: Mutex<Option<CodeExchangeRequest>>,
    next_id: AtomicUsize,
    authorize_calls: AtomicUsize,
    exchange_calls: AtomicUsize,
    list_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    sync_calls: AtomicUsize,
}

impl MockAuthority {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, connection: Connection) {
        self.connections.lock().unwrap().push(connection);
    }

    pub(crate) fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    pub(crate) fn fail_authorize(&self, error: ConnectError) {
        self.failures.lock().unwrap().authorize = Some(error);
    }

    pub(crate) fn fail_exchange(&self, error: ConnectError) {
        self.failures.lock().unwrap().exchange = Some(error);
    }

    pub(crate) fn fail_refresh(&self, error: ConnectError) {
        self.failures.lock().unwrap().refresh = Some(error);
    }

    pub(crate) fn fail_list(&self, error: ConnectError) {
        self.failures.lock().unwrap().list = Some(error);
    }

    pub(crate) fn fail_delete(&self, error: ConnectError) {
        self.failures.lock().unwrap().delete = Some(error);
    }

    pub(crate) fn fail_sync(&self, error: ConnectError) {
        self.failures.lock().unwrap().sync = Some(error);
    }

    pub(crate) fn last_authorize_request(&self) -> Option<AuthorizationUrlRequest> {
        self.last_authorize.lock().unwrap().clone()
    }

    pub(crate) fn last_exchange_request(&self) -> Option<CodeExchangeRequest> {
        self.last_exchange.lock().unwrap().clone()
    }

    pub(crate) fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    fn update(
        &self,
        user: &SessionUser,
        connection_id: &str,
        apply: impl FnOnce(&mut Connection),
    ) -> Result<Connection, ConnectError> {
        let mut connections = self.connections.lock().unwrap();
        let conn = connections
            .iter_mut()
            .find(|c| c.id == connection_id && c.user_id == user.id)
            .ok_or_else(|| ConnectError::ConnectionNotFound(connection_id.to_string()))?;
        apply(conn);
        conn.updated_at = Utc::now();
        Ok(conn.clone())
    }
}

#[async_trait]
impl BackendAuthority for MockAuthority {
    async fn authorization_url(
        &self,
        _user: &SessionUser,
        request: &AuthorizationUrlRequest,
    ) -> Result<AuthorizationUrlResponse, ConnectError> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_authorize.lock().unwrap() = Some(request.clone());
        if let Some(error) = self.failures.lock().unwrap().authorize.clone() {
            return Err(error);
        }
        Ok(AuthorizationUrlResponse {
            authorization_url: format!(
                "https://{}.example/authorize?state={}",
                request.platform, request.state
            ),
            code_verifier: Some(format!("verifier-{}", request.platform)),
        })
    }

    async fn exchange_code(
        &self,
        user: &SessionUser,
        request: &CodeExchangeRequest,
    ) -> Result<Connection, ConnectError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_exchange.lock().unwrap() = Some(request.clone());
        if let Some(error) = self.failures.lock().unwrap().exchange.clone() {
            return Err(error);
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let conn = connection(&format!("exchanged-{n}"), &user.id, request.platform);
        self.insert(conn.clone());
        Ok(conn)
    }

    async fn list_connections(&self, _user: &SessionUser) -> Result<Vec<Connection>, ConnectError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().unwrap().list.clone() {
            return Err(error);
        }
        // returned unfiltered so ownership filtering is exercised by callers
        Ok(self.connections.lock().unwrap().clone())
    }

    async fn delete_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<(), ConnectError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().unwrap().delete.clone() {
            return Err(error);
        }
        let mut connections = self.connections.lock().unwrap();
        let before = connections.len();
        connections.retain(|c| !(c.id == connection_id && c.user_id == user.id));
        if connections.len() == before {
            return Err(ConnectError::ConnectionNotFound(connection_id.to_string()));
        }
        Ok(())
    }

    async fn refresh_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Connection, ConnectError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().unwrap().refresh.clone() {
            return Err(error);
        }
        self.update(user, connection_id, |c| {
            c.access_token = SecretString::new(format!("access-{}-renewed", c.id));
            c.token_expires_at = Some(Utc::now() + Duration::hours(2));
        })
    }

    async fn sync_connection(
        &self,
        user: &SessionUser,
        connection_id: &str,
    ) -> Result<Connection, ConnectError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.lock().unwrap().sync.clone() {
            return Err(error);
        }
        self.update(user, connection_id, |c| {
            c.followers_count = c.followers_count.map(|n| n + 1);
            c.last_synced_at = Some(Utc::now());
        })
    }

    async fn connection_posts(
        &self,
        _user: &SessionUser,
        connection_id: &str,
    ) -> Result<Vec<PlatformPost>, ConnectError> {
        Ok(vec![PlatformPost {
            id: format!("{connection_id}-post-1"),
            text: Some("hello".to_string()),
            published_at: Some(Utc::now()),
            permalink: None,
            metrics: serde_json::json!({ "likes": 3 }),
        }])
    }
}
