//! Frame delimiting for PMPP over byte streams.
//!
//! A serial port or terminal server delivers frames as an undelimited byte
//! stream. [`PmppCodec`] splits it at `7E` flags and yields each complete
//! frame, flags included, ready for [`super::decode`].

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use super::{FLAG, MIN_FRAME_BODY};

/// Default upper bound on a buffered frame.
pub const DEFAULT_MAX_FRAME_LEN: usize = 8 * 1024;

/// Splits a byte stream into `7E ... 7E` frames.
///
/// Bytes outside a frame are dropped. Back-to-back frames may share a flag
/// (`7E a 7E b 7E`) or use two (`7E a 7E 7E b 7E`); both yield `a` then `b`.
/// A span between flags too short to hold the header and FCS is taken as
/// line noise and skipped.
#[derive(Debug, Clone)]
pub struct PmppCodec {
    max_frame_len: usize,
}

impl PmppCodec {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Reject frames (stuffed, including flags) longer than `max_frame_len`.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for PmppCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PmppCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Bytes>> {
        loop {
            // Drop noise before the opening flag
            let Some(start) = src.iter().position(|&b| b == FLAG) else {
                src.clear();
                return Ok(None);
            };
            src.advance(start);

            let Some(end) = src[1..].iter().position(|&b| b == FLAG).map(|i| i + 1) else {
                if src.len() > self.max_frame_len {
                    tracing::warn!(target: "ntcip_snmp::pmpp", { pmpp.buffered = src.len(), pmpp.max = self.max_frame_len }, "discarding oversized frame");
                    src.clear();
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "PMPP frame exceeds maximum length",
                    ));
                }
                return Ok(None);
            };

            if end - 1 < MIN_FRAME_BODY {
                // Empty flag pair, or noise between a closing and an opening flag
                tracing::trace!(target: "ntcip_snmp::pmpp", { pmpp.length = end - 1 }, "skipping runt frame");
                src.advance(end);
                continue;
            }

            if end + 1 > self.max_frame_len {
                tracing::warn!(target: "ntcip_snmp::pmpp", { pmpp.length = end + 1, pmpp.max = self.max_frame_len }, "discarding oversized frame");
                src.advance(end);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "PMPP frame exceeds maximum length",
                ));
            }

            let frame = Bytes::copy_from_slice(&src[..=end]);
            // The closing flag stays buffered so it can open the next frame
            src.advance(end);
            return Ok(Some(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;
    use crate::pmpp::{self, PmppEndPoint};

    fn frame(payload: &[u8]) -> Bytes {
        pmpp::encode(payload, &PmppEndPoint::NTCIP_DEFAULT)
    }

    #[test]
    fn test_waits_for_closing_flag() {
        let full = frame(&[0x30, 0x00]);
        let mut codec = PmppCodec::new();
        let mut buf = BytesMut::from(&full[..full.len() - 1]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.put_u8(FLAG);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), full);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_noise_and_back_to_back_frames() {
        let a = frame(&[0x01]);
        let b = frame(&[0x02, 0x7E]);

        let mut buf = BytesMut::new();
        buf.put_slice(&[0x11, 0x22]);
        buf.put_slice(&a);
        buf.put_slice(&b);

        let mut codec = PmppCodec::new();
        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first, a);
        assert_eq!(second, b);
        assert_eq!(&pmpp::decode(&second, false).unwrap().payload[..], &[0x02, 0x7E]);
    }

    #[test]
    fn test_shared_flag() {
        let a = frame(&[0x01]);
        let b = frame(&[0x02]);
        let mut buf = BytesMut::new();
        buf.put_slice(&a);
        buf.put_slice(&b[1..]);

        let mut codec = PmppCodec::new();
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), a);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), b);
    }

    #[test]
    fn test_noise_between_frames_skipped() {
        let a = frame(&[0x01]);
        let b = frame(&[0x02]);
        let mut buf = BytesMut::new();
        buf.put_slice(&a);
        buf.put_slice(&[0x00, 0xFF, FLAG]);
        buf.put_slice(&b);

        let mut codec = PmppCodec::new();
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), a);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), b);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut codec = PmppCodec::with_max_frame_len(8);
        let mut buf = BytesMut::from(&[FLAG, 1, 2, 3, 4, 5, 6, 7, 8, 9][..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(buf.is_empty());
    }
}
