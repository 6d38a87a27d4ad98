//! HTTP surface of the screen service.

pub mod error;
pub mod health;
pub mod request_id;
pub mod router;
pub mod screens;
pub mod shutdown;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::interpreter::Interpreter;
use crate::resolve::ScreenResolver;

pub use error::ServerError;
pub use router::{build_router, AppState};
pub use shutdown::ShutdownManager;

pub struct ScreenServer {
    pub addr: Option<SocketAddr>,
    /// Populated by bind(), consumed by run().
    listener: Option<TcpListener>,
    state: AppState,
    shutdown: Arc<ShutdownManager>,
}

impl ScreenServer {
    pub fn new(resolver: Arc<ScreenResolver>, interpreter: Arc<Interpreter>) -> Self {
        Self {
            addr: None,
            listener: None,
            state: AppState::new(resolver, interpreter),
            shutdown: Arc::new(ShutdownManager::new()),
        }
    }

    /// Bind the listener. Port `0` picks a free port; the actual address is
    /// returned and kept in [`addr`](Self::addr).
    pub async fn bind(&mut self, bind_addr: &str) -> Result<SocketAddr, ServerError> {
        let addr: SocketAddr = bind_addr
            .parse()
            .map_err(|err| ServerError::invalid_bind_addr(bind_addr, err))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::bind_failed(addr, err))?;
        let actual = listener.local_addr()?;

        self.addr = Some(actual);
        self.listener = Some(listener);
        tracing::info!(addr = %actual, "Screen service bound");
        Ok(actual)
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Serve until shutdown is signalled.
    ///
    /// Consumes self to take ownership of the listener; call bind() first.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = self
            .listener
            .ok_or_else(|| ServerError::Internal("bind() must be called before run()".to_string()))?;
        let app = build_router(self.state);

        tracing::info!(addr = ?self.addr, "Screen service listening");
        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait_for_shutdown().await })
            .await?;

        tracing::info!("Screen service stopped");
        Ok(())
    }
}

#[derive(Clone)]
pub struct ServerHandle {
    shutdown: Arc<ShutdownManager>,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        self.shutdown.signal_shutdown();
    }
}
