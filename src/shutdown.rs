use actix_web::dev::ServerHandle;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::db::SharedStore;

/// Handles graceful shutdown of the application
///
/// 1. Listens for shutdown signals (SIGTERM, SIGINT/CTRL+C)
/// 2. Stops the HTTP server, letting in-flight requests finish
/// 3. Closes the document store
pub struct ShutdownCoordinator {
    server_handle: ServerHandle,
    server_task: JoinHandle<Result<(), std::io::Error>>,
    store: SharedStore,
}

impl ShutdownCoordinator {
    pub fn new(
        server_handle: ServerHandle,
        server_task: JoinHandle<Result<(), std::io::Error>>,
        store: SharedStore,
    ) -> Self {
        Self {
            server_handle,
            server_task,
            store,
        }
    }

    /// Wait for CTRL+C or SIGTERM (Unix only), then shut down
    pub async fn wait_for_shutdown(self) -> Result<(), std::io::Error> {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        #[cfg(unix)]
        let terminate = terminate.recv();

        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            result = ctrl_c => {
                result?;
                info!("Received CTRL+C signal, initiating graceful shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM signal, initiating graceful shutdown...");
            }
        }

        self.shutdown().await
    }

    async fn shutdown(self) -> Result<(), std::io::Error> {
        // 1. Stop HTTP server (stop accepting new requests)
        info!("Stopping HTTP server (no longer accepting new requests)...");
        self.server_handle.stop(true).await;

        // 2. Wait for HTTP server task to complete
        match self.server_task.await {
            Ok(Ok(_)) => info!("HTTP server shut down successfully"),
            Ok(Err(e)) => error!("HTTP server encountered error during shutdown: {:?}", e),
            Err(e) => error!("HTTP server task panicked: {:?}", e),
        }

        // 3. Close the store
        info!("Closing document store...");
        self.store.close().await;

        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
