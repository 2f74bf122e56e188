//! Point-to-point UDP transport.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::UdpSocket;

use super::Transport;
use crate::error::{Error, Result};
use crate::util::{bind_udp_socket, unspecified_for};

/// Largest datagram accepted by default.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65535;

/// UDP transport connected to a single agent.
///
/// The socket is connected, so datagrams from other sources are filtered by
/// the kernel.
pub struct UdpTransport {
    socket: UdpSocket,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    peer: String,
    max_message_size: usize,
}

impl UdpTransport {
    /// Bind an ephemeral local port and connect to `target`.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        Self::connect_with(target, DEFAULT_MAX_MESSAGE_SIZE).await
    }

    /// Like [`connect`](Self::connect) with a custom receive size.
    pub async fn connect_with(target: SocketAddr, max_message_size: usize) -> Result<Self> {
        let peer = target.to_string();
        let io_err = |e| Error::io(Some(peer.clone()), e);

        let socket =
            bind_udp_socket(unspecified_for(target), Some(max_message_size)).map_err(io_err)?;
        socket.connect(target).await.map_err(io_err)?;
        let local_addr = socket.local_addr().map_err(io_err)?;

        tracing::debug!(target: "ntcip_snmp::transport", { snmp.peer = %target, snmp.local_addr = %local_addr }, "UDP transport connected");

        Ok(Self {
            socket,
            peer_addr: target,
            local_addr,
            peer,
            max_message_size,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(target: "ntcip_snmp::transport", { snmp.peer = %self.peer_addr, snmp.bytes = data.len() }, "UDP send");
        self.socket
            .send(data)
            .await
            .map_err(|e| Error::io(Some(self.peer.clone()), e))?;
        Ok(())
    }

    async fn recv(&self) -> Result<Bytes> {
        let mut buf = vec![0u8; self.max_message_size];
        let len = self
            .socket
            .recv(&mut buf)
            .await
            .map_err(|e| Error::io(Some(self.peer.clone()), e))?;
        buf.truncate(len);
        tracing::trace!(target: "ntcip_snmp::transport", { snmp.peer = %self.peer_addr, snmp.bytes = len }, "UDP recv");
        Ok(Bytes::from(buf))
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}
