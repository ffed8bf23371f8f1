//! Binding and serving, plain or TLS, until a shutdown signal.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::signal;
use tracing::{info, warn};

/// How long in-flight TLS connections get to finish on shutdown.
const TLS_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Both files must exist before anything is bound.
pub fn check_tls_files(cert: &Path, key: &Path) -> anyhow::Result<TlsFiles> {
    let cert = std::fs::canonicalize(cert).unwrap_or_else(|_| cert.to_path_buf());
    if !cert.is_file() {
        anyhow::bail!("Certificate file \"{}\" doesn't exist", cert.display());
    }
    let key = std::fs::canonicalize(key).unwrap_or_else(|_| key.to_path_buf());
    if !key.is_file() {
        anyhow::bail!("Private key file \"{}\" doesn't exist", key.display());
    }
    Ok(TlsFiles { cert, key })
}

pub fn scheme(tls: bool) -> &'static str {
    if tls {
        "https"
    } else {
        "http"
    }
}

/// Bind `addr` and serve `app` until Ctrl+C or SIGTERM.
pub async fn serve(app: Router, addr: &str, tls: Option<TlsFiles>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).with_context(|| format!("bind {}", addr))?;
    listener.set_nonblocking(true)?;

    match tls {
        None => {
            let listener = tokio::net::TcpListener::from_std(listener)?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Some(files) => {
            let config = RustlsConfig::from_pem_file(&files.cert, &files.key)
                .await
                .context("load TLS certificate and key")?;
            let handle = axum_server::Handle::new();
            let shutdown = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown.graceful_shutdown(Some(TLS_SHUTDOWN_GRACE));
            });
            axum_server::from_tcp_rustls(listener, config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
