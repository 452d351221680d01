use crate::connection::handle_connection;
use crate::session::SessionRegistry;
use crate::AppState;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Accept loop: one task per connection, each under a fresh session id.
pub struct Server {
    listener: TcpListener,
    registry: SessionRegistry,
    state: Arc<AppState>,
}

impl Server {
    /// `registry` must be the one whose table backs `state.limiter`.
    pub async fn bind(addr: &str, registry: SessionRegistry, state: Arc<AppState>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to listen on {}", addr))?;
        Ok(Self {
            listener,
            registry,
            state,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs until the process is terminated.
    pub async fn run(mut self) {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            };

            let session = self.registry.next_session_id();
            info!(session = %session, peer = %peer, "connected");

            tokio::spawn(handle_connection(Arc::clone(&self.state), session, stream));
        }
    }
}
