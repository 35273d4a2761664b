use axum::{Router, routing::get};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_connect::SyncPolicy;
use social_connect_axum::{SOCIAL_ROUTE_PREFIX, SocialState, init, social_connect_router};

mod handlers;
mod server;
mod session;

use crate::{
    handlers::index,
    server::{Ports, TlsPaths, spawn_http_server, spawn_https_server},
    session::DemoSessions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // axum-server's rustls needs a process-level CryptoProvider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install default CryptoProvider")?;

    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,social_connect=debug,social_connect_axum=debug,tower_http=info",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let service = Arc::new(init().await?);
    let sessions = Arc::new(DemoSessions::from_env());

    // Keep the demo user's connections fresh in the background
    let _maintenance = sessions.user().map(|user| {
        let scheduler = Arc::new(service.scheduler(SyncPolicy::default()));
        scheduler.spawn(user.clone(), session::maintenance_period())
    });

    let state = SocialState::new(service, sessions.clone());
    let app = Router::new()
        .route("/", get(index))
        .with_state(sessions)
        .nest(SOCIAL_ROUTE_PREFIX.as_str(), social_connect_router(state));

    let ports = Ports::from_env();
    let mut servers = vec![spawn_http_server(ports.http, app.clone())];
    match TlsPaths::from_env() {
        Some(tls) => servers.push(spawn_https_server(ports.https, tls, app).await?),
        None => tracing::info!("DEMO_TLS_CERT/DEMO_TLS_KEY not set, serving HTTP only"),
    }

    // Servers run until the process is stopped
    for server in servers {
        server.await?;
    }
    Ok(())
}
