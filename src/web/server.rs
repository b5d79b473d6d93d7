use std::sync::Arc;

use axum::Router;
use tokio::sync::Notify;

use super::mission_api;
use crate::config::CONFIG;

use anyhow::{Context, Result};

pub struct WebServer {
    shutdown: Arc<Notify>,
}

impl WebServer {
    pub async fn new() -> Self {
        Self {
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let app = Router::new().merge(mission_api::routes());

        let host = CONFIG.web.host.clone();
        let port = CONFIG.web.port;
        tracing::info!("Starting mission API on http://{}:{}", host, port);

        let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
            .await
            .context(format!("Failed to bind to port {}", port))?;

        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.notified().await })
            .await
            .context("Failed to serve")?;

        Ok(())
    }

    pub async fn stop(&self) {
        self.shutdown.notify_one();
    }
}
