use crate::common::{MockAuthorityServer, service_for, stored_connection, test_user};
use chrono::{Duration, Utc};
use social_connect::{ConnectError, Platform, RefreshFailure, SyncPolicy};

#[tokio::test]
async fn test_list_refresh_sync_posts() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockAuthorityServer::start().await;
    server.insert(stored_connection("c1", "alice", "twitter"));
    let service = service_for(&server.base_url);
    let user = test_user("alice");

    let before = service.registry().list(Some(&user)).await?;
    assert_eq!(before.len(), 1);
    assert!(before[0].last_synced_at.is_none());

    let refreshed = service.registry().refresh(Some(&user), "c1").await?;
    assert_eq!(refreshed.id, "c1");
    assert_eq!(server.refresh_calls(), 1);

    let synced = service.registry().sync(Some(&user), "c1").await?;
    assert!(synced.last_synced_at.is_some());
    assert_eq!(synced.followers_count, Some(105));

    let posts = service.registry().posts(Some(&user), "c1").await?;
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].metrics["likes"], 12);
    assert!(posts[1].text.is_none());

    Ok(())
}

#[tokio::test]
async fn test_disconnect_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockAuthorityServer::start().await;
    server.insert(stored_connection("c1", "alice", "linkedin"));
    let service = service_for(&server.base_url);
    let user = test_user("alice");

    service.registry().disconnect(Some(&user), "c1").await?;
    service.registry().disconnect(Some(&user), "c1").await?;

    assert!(service.registry().list(Some(&user)).await?.is_empty());
    assert!(server.connections().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_other_users_connections_are_invisible() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockAuthorityServer::start().await;
    server.insert(stored_connection("bobs", "bob", "twitter"));
    let service = service_for(&server.base_url);
    let alice = test_user("alice");

    assert!(service.registry().list(Some(&alice)).await?.is_empty());

    let result = service.registry().sync(Some(&alice), "bobs").await;
    assert!(matches!(result, Err(ConnectError::ConnectionNotFound(_))));

    service.registry().disconnect(Some(&alice), "bobs").await?;
    assert_eq!(server.connections().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_refresh_without_refresh_token() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockAuthorityServer::start().await;
    let mut conn = stored_connection("c1", "alice", "instagram");
    conn.refresh_token = None;
    server.insert(conn);
    let service = service_for(&server.base_url);

    let result = service
        .registry()
        .refresh(Some(&test_user("alice")), "c1")
        .await;
    assert!(matches!(
        result,
        Err(ConnectError::RefreshFailed(RefreshFailure::NoRefreshToken))
    ));
    assert_eq!(server.refresh_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_sync_failure_carries_authority_message() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockAuthorityServer::start().await;
    server.insert(stored_connection("c1", "alice", "tiktok"));
    let service = service_for(&server.base_url);

    let result = service.registry().sync(Some(&test_user("alice")), "c1").await;
    assert!(matches!(
        result,
        Err(ConnectError::SyncFailed(m)) if m == "TikTok API unavailable"
    ));
    Ok(())
}

#[tokio::test]
async fn test_scheduler_pass_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockAuthorityServer::start().await;
    let now = Utc::now();

    let mut expiring = stored_connection("expiring", "alice", "twitter");
    expiring.token_expires_at = Some(now + Duration::seconds(30));
    expiring.last_synced_at = Some(now);
    server.insert(expiring);

    let mut failing = stored_connection("failing", "alice", "tiktok");
    failing.token_expires_at = None;
    server.insert(failing);

    let service = service_for(&server.base_url);
    let report = service
        .scheduler(SyncPolicy::default())
        .run_once(Some(&test_user("alice")))
        .await?;

    assert_eq!(report.refreshed, vec!["expiring".to_string()]);
    assert!(report.synced.is_empty());
    assert!(matches!(
        report.failures.as_slice(),
        [(id, ConnectError::SyncFailed(_))] if id == "failing"
    ));

    let platforms: Vec<Platform> = service
        .registry()
        .list(Some(&test_user("alice")))
        .await?
        .iter()
        .map(|c| c.platform)
        .collect();
    assert_eq!(platforms, vec![Platform::Tiktok, Platform::Twitter]);
    Ok(())
}
