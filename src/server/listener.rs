use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, debug, error, info};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::resolver::Resolver;

/// Pause after a failed accept, e.g. while out of file descriptors.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Source of incoming connections.
pub trait Acceptor: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static;

    fn accept(&self) -> impl Future<Output = io::Result<(Self::Stream, SocketAddr)>> + Send;
}

impl Acceptor for TcpListener {
    type Stream = TcpStream;

    fn accept(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        TcpListener::accept(self)
    }
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    // Refuse to start without a usable document root.
    let resolver = Resolver::new(&cfg.server.doc_root)?;

    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!(
        "Listening on {}, serving {}",
        cfg.server.listen_addr,
        resolver.root().display()
    );

    serve(listener, resolver, cfg.server.idle_timeout()).await;
    Ok(())
}

/// Accepts connections forever, one task per connection. A failed accept is
/// logged and retried after `ACCEPT_BACKOFF`.
pub async fn serve<A: Acceptor>(listener: A, resolver: Resolver, idle_timeout: Duration) {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        debug!("Accepted connection from {}", peer);

        let resolver = resolver.clone();
        let span = tracing::info_span!("connection", %peer);
        tokio::spawn(
            async move {
                let mut conn = Connection::new(socket, resolver).with_idle_timeout(idle_timeout);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {}: {:#}", peer, e);
                }
            }
            .instrument(span),
        );
    }
}
