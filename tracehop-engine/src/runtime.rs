/*!
# Node Runtime

Binds the listener, serves the router and shuts down gracefully, flushing
pending spans last. Failing to bind is the only error that stops the process
once configuration is loaded.
*/

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use tracehop_config::NodeConfig;
use tracehop_telemetry::{MetricsRecorder, NodeTracer};

use crate::error::NodeError;
use crate::handler::router;
use crate::state::NodeState;

/// A bound, not yet serving, node.
pub struct Node {
    listener: TcpListener,
    router: Router,
    tracer: NodeTracer,
}

impl Node {
    pub async fn bind(config: &NodeConfig, metrics: MetricsRecorder) -> Result<Self, NodeError> {
        let state = Arc::new(NodeState::from_config(config, metrics)?);
        let address = config.server.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| NodeError::Bind { address, source })?;

        Ok(Self {
            listener,
            tracer: state.tracer.clone(),
            router: router(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NodeError> {
        self.listener.local_addr().map_err(NodeError::Serve)
    }

    /// Serves until `shutdown` resolves, then lets in-flight requests finish
    /// and flushes their spans.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), NodeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let served = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(NodeError::Serve);

        let tracer = self.tracer;
        if let Err(error) = tokio::task::spawn_blocking(move || tracer.shutdown()).await {
            warn!(%error, "Span flush did not complete");
        }
        served
    }
}

/// Runs a node until SIGINT/SIGTERM.
#[instrument(level = "info", name = "node", skip_all, fields(app = %config.server.app_name))]
pub async fn run_node(config: NodeConfig, metrics: MetricsRecorder) -> Result<(), NodeError> {
    let node = Node::bind(&config, metrics).await?;
    info!(
        address = %node.local_addr()?,
        environment = %config.server.environment,
        mode = %config.fanout.mode,
        targets = config.fanout.targets.len(),
        "Listening"
    );

    node.serve(shutdown_signal()).await?;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
