use anyhow::Result;

use skyroute::config::CONFIG;
use skyroute::dispatch::DispatchLink;
use skyroute::util;
use skyroute::web::server::WebServer;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    util::setup_logging(&CONFIG.general.log_level);
    info!("Application starting...");
    info!("Vehicle: {}", CONFIG.general.vehicle_id);

    // Create a shutdown signal channel
    let (shutdown_tx, _) = broadcast::channel(1);

    // Opening the link at startup is best-effort; bench runs without the
    // vehicle attached are expected and the first transmit will retry.
    let link = DispatchLink::instance().await;
    if let Err(e) = link.connect().await {
        warn!("Flight controller not reachable at startup: {}", e);
    }

    let web_server = WebServer::new().await;
    let web_handle = spawn_web_server(web_server, shutdown_tx.subscribe()).await;

    let shutdown_signal = async {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping services...");
                shutdown_tx
                    .send(())
                    .expect("Failed to send shutdown signal");
            }
            Err(err) => {
                error!("Failed to listen for shutdown signal: {}", err);
            }
        }
    };

    let results = tokio::join!(web_handle, shutdown_signal);
    if let Err(e) = results.0 {
        error!("Web server join error: {}", e);
    }

    info!("All services stopped, shutting down");

    Ok(())
}

async fn spawn_web_server(
    server: WebServer,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = server.start() => {
                if let Err(e) = result {
                    error!("Web server error: {}", e);
                }
            }
            _ = shutdown.recv() => {
                info!("Shutting down web server...");
                server.stop().await;
            }
        }
    })
}
