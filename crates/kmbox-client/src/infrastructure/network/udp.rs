//! UDP command socket.
//!
//! The socket is bound to an ephemeral local port and connected to the
//! device, so `send`/`recv` need no address and datagrams from any other
//! peer are dropped by the OS.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::application::dispatch::CommandTransport;
use crate::error::ClientError;

/// [`CommandTransport`] over a connected tokio [`UdpSocket`].
pub struct UdpTransport {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpTransport {
    /// Binds an ephemeral local port and sets `remote` as the default peer.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Bind`] if no local port can be bound, or
    /// [`ClientError::Io`] if the peer address is unusable.
    pub async fn connect(remote: SocketAddr) -> Result<Self, ClientError> {
        let local = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| ClientError::Bind { addr: local, source })?;
        socket.connect(remote).await?;
        debug!(%remote, local = ?socket.local_addr().ok(), "command socket connected");
        Ok(Self { socket, remote })
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl CommandTransport for UdpTransport {
    async fn send(&self, datagram: &[u8]) -> std::io::Result<usize> {
        self.socket.send(datagram).await
    }

    async fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.socket.recv(buf).await
    }
}
