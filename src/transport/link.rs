//! PMPP multidrop link over a byte stream.
//!
//! Roadside controllers on a shared serial line are usually reached through a
//! terminal server that exposes the line as a TCP socket. Any
//! `AsyncRead + AsyncWrite` stream works, so a serial port driver can be
//! plugged in the same way.

use std::future::poll_fn;
use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio_util::codec::FramedRead;

use super::Transport;
use crate::error::{Error, Result};
use crate::pmpp::codec::PmppCodec;

/// Transport that exchanges `7E`-delimited PMPP frames on a byte stream.
///
/// Every station on the line sees every frame; the session matches replies
/// to requests by request id.
pub struct LinkTransport<S> {
    reader: Mutex<FramedRead<ReadHalf<S>, PmppCodec>>,
    writer: Mutex<WriteHalf<S>>,
    peer: String,
}

impl<S> LinkTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap a connected stream.
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self::with_codec(stream, peer, PmppCodec::new())
    }

    /// Wrap a connected stream with a custom frame size limit.
    pub fn with_codec(stream: S, peer: impl Into<String>, codec: PmppCodec) -> Self {
        let (read, write) = tokio::io::split(stream);
        Self {
            reader: Mutex::new(FramedRead::new(read, codec)),
            writer: Mutex::new(write),
            peer: peer.into(),
        }
    }
}

impl LinkTransport<TcpStream> {
    /// Connect to a terminal server.
    pub async fn connect_tcp(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let peer = addr.to_string();
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::io(Some(peer.clone()), e))?;
        // Frames are small and latency bound
        stream
            .set_nodelay(true)
            .map_err(|e| Error::io(Some(peer.clone()), e))?;
        tracing::debug!(target: "ntcip_snmp::transport", { snmp.peer = %peer }, "PMPP link connected");
        Ok(Self::new(stream, peer))
    }
}

impl<S> Transport for LinkTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn send(&self, frame: &[u8]) -> Result<()> {
        tracing::trace!(target: "ntcip_snmp::transport", { snmp.peer = %self.peer, snmp.bytes = frame.len() }, "link send");
        let mut writer = self.writer.lock().await;
        writer
            .write_all(frame)
            .await
            .map_err(|e| Error::io(Some(self.peer.clone()), e))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::io(Some(self.peer.clone()), e))
    }

    async fn recv(&self) -> Result<Bytes> {
        let mut reader = self.reader.lock().await;
        let next = poll_fn(|cx| Pin::new(&mut *reader).poll_next(cx)).await;
        match next {
            Some(Ok(frame)) => {
                tracing::trace!(target: "ntcip_snmp::transport", { snmp.peer = %self.peer, snmp.bytes = frame.len() }, "link recv");
                Ok(frame)
            }
            Some(Err(e)) => Err(Error::io(Some(self.peer.clone()), e)),
            None => Err(Error::io(
                Some(self.peer.clone()),
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "link closed"),
            )),
        }
    }

    fn peer(&self) -> &str {
        &self.peer
    }

    fn is_framed(&self) -> bool {
        true
    }
}
