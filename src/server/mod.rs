//! TCP / TLS Server
//!
//! Owns the listening socket and the accept loop. Every accepted connection
//! gets its own task running a [`ConnectionHandler`](crate::connection::ConnectionHandler).
//!
//! ```text
//!   Server::bind ──> TcpListener (+ optional TlsAcceptor)
//!        │
//!        ▼
//!   Server::run ──> accept() ──> tokio::spawn ──> [TLS handshake] ──> handle_connection
//!        ▲                                                                │
//!        └────────────────────────── loop ◄───────────────────────────────┘
//! ```
//!
//! Binding (and loading TLS material) happens up front so misconfiguration
//! surfaces at startup. After that the accept loop never gives up: accept
//! errors are logged and the loop continues.

pub mod tls;

use crate::commands::Dispatcher;
use crate::config::ServerConfig;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::Datastore;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, warn};

pub use tls::{build_acceptor, TlsError};

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error(transparent)]
    Tls(#[from] TlsError),
}

/// A bound server, ready to accept connections.
pub struct Server {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    dispatcher: Dispatcher,
    stats: Arc<ConnectionStats>,
}

impl Server {
    /// Binds the listener described by `config`.
    ///
    /// When TLS is enabled the certificate, key and CA bundle are loaded
    /// here; any failure is returned instead of starting a half-working
    /// server.
    pub async fn bind(
        config: &ServerConfig,
        store: Arc<Datastore>,
        stats: Arc<ConnectionStats>,
    ) -> Result<Self, ServerError> {
        let tls = if config.tls.enabled {
            Some(build_acceptor(&config.tls)?)
        } else {
            None
        };

        let address = format!("{}:{}", config.address, config.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        info!(
            address = %address,
            tls = tls.is_some(),
            "Listening for connections"
        );

        Ok(Self {
            listener,
            tls,
            dispatcher: Dispatcher::new(store),
            stats,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever. Drop the future to stop accepting.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.spawn_connection(stream, addr),
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let dispatcher = self.dispatcher.clone();
        let stats = Arc::clone(&self.stats);

        match &self.tls {
            None => {
                tokio::spawn(handle_connection(stream, addr, dispatcher, stats));
            }
            Some(acceptor) => {
                let acceptor = acceptor.clone();
                // The handshake runs in the connection task so a slow client
                // cannot stall the accept loop.
                tokio::spawn(async move {
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => {
                            handle_connection(tls_stream, addr, dispatcher, stats).await
                        }
                        Err(e) => warn!(client = %addr, error = %e, "TLS handshake failed"),
                    }
                });
            }
        }
    }
}
