use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::{env, net::SocketAddr, path::PathBuf};
use tokio::task::JoinHandle;

#[derive(Clone, Copy)]
pub(crate) struct Ports {
    pub(crate) http: u16,
    pub(crate) https: u16,
}

impl Ports {
    pub(crate) fn from_env() -> Self {
        Self {
            http: port_from_env("DEMO_HTTP_PORT", 3001),
            https: port_from_env("DEMO_HTTPS_PORT", 3443),
        }
    }
}

fn port_from_env(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(default)
}

/// PEM certificate and key for the HTTPS listener.
pub(crate) struct TlsPaths {
    cert: PathBuf,
    key: PathBuf,
}

impl TlsPaths {
    pub(crate) fn from_env() -> Option<Self> {
        Some(Self {
            cert: env::var("DEMO_TLS_CERT").ok()?.into(),
            key: env::var("DEMO_TLS_KEY").ok()?.into(),
        })
    }
}

pub(crate) fn spawn_http_server(port: u16, app: Router) -> JoinHandle<()> {
    tokio::spawn(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tracing::info!("HTTP server listening on {}", addr);
        if let Err(e) = axum_server::bind(addr)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("HTTP server on {} stopped: {}", addr, e);
        }
    })
}

pub(crate) async fn spawn_https_server(
    port: u16,
    tls: TlsPaths,
    app: Router,
) -> std::io::Result<JoinHandle<()>> {
    let config = RustlsConfig::from_pem_file(tls.cert, tls.key).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTPS server listening on {}", addr);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum_server::bind_rustls(addr, config)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("HTTPS server on {} stopped: {}", addr, e);
        }
    }))
}
