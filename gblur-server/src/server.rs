//! TCP accept loop
//!
//! One task per accepted connection, no admission limit, no shared mutable
//! state between connections.

use crate::error::{Error, Result};
use crate::handler::{handle_connection, HandlerSettings};
use gblur_common::TomlConfig;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Bound blur server, ready to accept
pub struct BlurServer {
    listener: TcpListener,
    settings: HandlerSettings,
}

impl BlurServer {
    /// Bind using the resolved configuration
    pub async fn bind(config: &TomlConfig) -> Result<Self> {
        Self::bind_addr(&config.bind_addr(), HandlerSettings::from_config(config)).await
    }

    /// Bind to an explicit address; port 0 picks a free port
    pub async fn bind_addr(addr: &str, settings: HandlerSettings) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;
        Ok(Self { listener, settings })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!("Blur server listening on {}", addr);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopped accepting connections on {}", addr);
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => spawn_connection(stream, peer, self.settings),
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },
            }
        }
    }
}

fn spawn_connection(stream: TcpStream, peer: SocketAddr, settings: HandlerSettings) {
    let span = info_span!("connection", id = %Uuid::new_v4(), %peer);

    tokio::spawn(
        async move {
            info!("New connection");
            match handle_connection(stream, settings).await {
                Ok(summary) => info!(
                    "Blurred {}x{} (workers={}, radius={}) in {:?}, {} bytes in, {} bytes out",
                    summary.width,
                    summary.height,
                    summary.job.workers,
                    summary.job.radius,
                    summary.elapsed,
                    summary.request_bytes,
                    summary.reply_bytes
                ),
                Err(e) if e.is_client_fault() => warn!("Request failed: {}", e),
                Err(e) => error!("Request failed: {}", e),
            }
        }
        .instrument(span),
    );
}
