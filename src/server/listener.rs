use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tracing::info;

use crate::config::Config;
use crate::files::ServedDirectory;
use crate::http::connection::Connection;

/// Binds `addr` with `SO_REUSEADDR` so a restarted server can rebind at once.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = tokio::net::lookup_host(addr)
        .await
        .with_context(|| format!("cannot resolve listen address {addr}"))?
        .next()
        .with_context(|| format!("listen address {addr} resolved to nothing"))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("failed to bind {addr}"))?;

    Ok(socket.listen(1024)?)
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let served = match &cfg.directory {
        Some(dir) => Some(Arc::new(ServedDirectory::new(dir)?)),
        None => None,
    };

    let listener = bind(&cfg.listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    match &served {
        Some(dir) => info!("Serving files from {}", dir.root().display()),
        None => info!("No directory configured, /files/ routes answer 404"),
    }

    serve(listener, served).await
}

/// Accepts connections forever, one task per connection. Only an accept
/// failure ends the loop.
pub async fn serve(
    listener: TcpListener,
    served: Option<Arc<ServedDirectory>>,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let served = served.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, served);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
