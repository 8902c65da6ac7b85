//! Probe server startup, used by `serve` and by standalone harness runs.

use anyhow::{Context, Result};
use axum::http::HeaderName;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::drivers::DriverRegistry;
use crate::probe::{ProbeRegistry, ProcessStart};
use crate::routes::{self, AppState};

/// Build the shared handler state from a config and its drivers.
///
/// The process start time is captured here, once.
pub fn build_state(config: &ServerConfig, drivers: DriverRegistry) -> Result<AppState> {
    let region_header = HeaderName::from_bytes(config.region_header.as_bytes())
        .with_context(|| format!("Invalid region header: {}", config.region_header))?;
    let process_start = ProcessStart::now();

    Ok(AppState {
        probes: Arc::new(ProbeRegistry::from_drivers(drivers, process_start)),
        repeat_policy: config.repeat_policy,
        region_header,
        process_start,
    })
}

/// Serve until Ctrl+C / SIGTERM
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let drivers = config.build_drivers()?;
    tracing::info!("✅ {} database driver(s) configured", drivers.len());

    let state = build_state(config, drivers)?;
    let app = routes::build_app(state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("🚀 Probe server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server shutdown complete");
    Ok(())
}

/// A probe server running on a background task
pub struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl RunningServer {
    /// Bind and start serving in the background
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        let drivers = config.build_drivers()?;
        Self::start_with_drivers(config, drivers).await
    }

    /// Start with an explicit driver set
    pub async fn start_with_drivers(config: &ServerConfig, drivers: DriverRegistry) -> Result<Self> {
        let state = build_state(config, drivers)?;
        let app = routes::build_app(state);

        let addr = format!("{}:{}", config.server_host, config.server_port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!("Background probe server failed: {}", e);
            }
        });

        tracing::info!("Probe server started on http://{}", addr);
        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle graceful shutdown signal
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
