//! Transport layer abstraction.
//!
//! Provides the `Transport` trait and implementations for point-to-point UDP
//! and for PMPP multidrop links carried over a byte stream.

mod link;
mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use link::*;
pub use udp::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;

/// Client-side transport abstraction.
///
/// A transport moves whole messages: one datagram for UDP, one `7E`-delimited
/// frame for a PMPP link. Timeouts, retries and request-id correlation belong
/// to [`Session`](crate::session::Session), which wraps [`recv`](Transport::recv)
/// in its own deadline. Implementations must therefore be cancel safe: dropping
/// a pending `recv` must not lose bytes that belong to a later message.
pub trait Transport: Send + Sync + 'static {
    /// Send one message.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next message.
    fn recv(&self) -> impl Future<Output = Result<Bytes>> + Send;

    /// Human-readable peer description for logs and errors.
    fn peer(&self) -> &str;

    /// Whether messages on this transport are PMPP frames.
    ///
    /// A session on a framed transport without an explicit endpoint uses
    /// [`PmppEndPoint::NTCIP_DEFAULT`](crate::pmpp::PmppEndPoint::NTCIP_DEFAULT).
    fn is_framed(&self) -> bool {
        false
    }
}
