//! BER decoding.
//!
//! [`Decoder`] is an owned cursor: a shared `Bytes` handle plus an offset.
//! Sub-decoders for constructed types share the same allocation and are
//! bounded by the declared content length, so a decode can never read past
//! the TLV that contains it.

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
#[derive(Debug, Clone)]
pub struct Decoder {
    data: Bytes,
    offset: usize,
    /// Offset of `data[0]` within the outermost buffer, for error reporting.
    base: usize,
}

impl Decoder {
    /// Create a new decoder from bytes.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            base: 0,
        }
    }

    /// Create a decoder from a byte slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Get the current offset, relative to the outermost buffer.
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Check if we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    fn error(&self, kind: DecodeErrorKind) -> Error {
        tracing::debug!(target: "ntcip_snmp::ber", { snmp.offset = self.offset(), kind = %kind }, "BER decode failed");
        Error::decode(self.offset(), kind)
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.offset) else {
            return Err(self.error(DecodeErrorKind::TruncatedData));
        };
        self.offset += 1;
        Ok(byte)
    }

    /// Read a tag byte.
    pub fn read_tag(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Read a length.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..], self.offset())?;
        self.offset += consumed;
        Ok(len)
    }

    /// Read raw bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(self.error(DecodeErrorKind::InsufficientData {
                needed: len,
                available: self.remaining(),
            }));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read and expect a specific tag, returning the content length.
    ///
    /// The declared length is checked against the bytes that remain, so a
    /// truncated buffer fails here rather than on the following read.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let actual = self.peek_tag().ok_or_else(|| self.error(DecodeErrorKind::TruncatedData))?;
        if actual != expected {
            return Err(self.error(DecodeErrorKind::UnexpectedTag { expected, actual }));
        }
        self.offset += 1;
        let len = self.read_length()?;
        if len > self.remaining() {
            return Err(self.error(DecodeErrorKind::InsufficientData {
                needed: len,
                available: self.remaining(),
            }));
        }
        Ok(len)
    }

    /// Read a tag and its length, whatever the tag is.
    pub fn read_header(&mut self) -> Result<(u8, usize)> {
        let tag = self.read_tag()?;
        let len = self.read_length()?;
        if len > self.remaining() {
            return Err(self.error(DecodeErrorKind::TlvOverflow));
        }
        Ok((tag, len))
    }

    /// Read a BER INTEGER (signed).
    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read integer value given the length.
    ///
    /// Redundant leading sign octets are skipped before interpreting the
    /// value, so the `0xFF 0x80` filler some agents emit (nine consecutive
    /// one bits) decodes the same as the minimal `0x80`.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len == 0 {
            return Err(self.error(DecodeErrorKind::ZeroLengthInteger));
        }
        let bytes = self.read_bytes(len)?;
        let content = strip_redundant_sign_octets(&bytes);

        if content.len() > 4 {
            // Permissive: keep the low-order octets (matches net-snmp truncation)
            tracing::warn!(target: "ntcip_snmp::ber", { snmp.offset = self.offset(), length = len }, "integer too long, truncating to 4 bytes");
        }
        let content = &content[content.len().saturating_sub(4)..];

        let seed: i32 = if content[0] & 0x80 != 0 { -1 } else { 0 };
        Ok(content
            .iter()
            .fold(seed, |value, &byte| (value << 8) | byte as i32))
    }

    /// Read a 64-bit unsigned integer (Counter64).
    pub fn read_integer64(&mut self, expected_tag: u8) -> Result<u64> {
        let len = self.expect_tag(expected_tag)?;
        self.read_integer64_value(len)
    }

    /// Read 64-bit unsigned integer value given the length.
    pub fn read_integer64_value(&mut self, len: usize) -> Result<u64> {
        if len == 0 {
            return Err(self.error(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 9 {
            // 9 bytes max: 1 leading zero + 8 bytes for u64
            return Err(self.error(DecodeErrorKind::Integer64TooLong { length: len }));
        }

        let bytes = self.read_bytes(len)?;
        Ok(bytes
            .iter()
            .fold(0u64, |value, &byte| (value << 8) | byte as u64))
    }

    /// Read an unsigned 32-bit integer with specific tag.
    pub fn read_unsigned32(&mut self, expected_tag: u8) -> Result<u32> {
        let len = self.expect_tag(expected_tag)?;
        self.read_unsigned32_value(len)
    }

    /// Read unsigned 32-bit integer value given length.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        if len == 0 {
            return Err(self.error(DecodeErrorKind::ZeroLengthInteger));
        }
        let bytes = self.read_bytes(len)?;

        let first_significant = bytes.iter().position(|&b| b != 0).unwrap_or(len - 1);
        let content = &bytes[first_significant..];
        if content.len() > 4 {
            tracing::warn!(target: "ntcip_snmp::ber", { snmp.offset = self.offset(), length = len }, "unsigned integer too long, truncating to 4 bytes");
        }
        let content = &content[content.len().saturating_sub(4)..];

        Ok(content
            .iter()
            .fold(0u32, |value, &byte| (value << 8) | byte as u32))
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return Err(self.error(DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        let start = self.offset();
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|e| match e {
            Error::Decode { offset, kind } => Error::decode(start + offset, kind),
            other => other,
        })
    }

    /// Read a SEQUENCE, returning a decoder for its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed type with a specific tag, returning a decoder for its contents.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        self.sub_decoder(len)
    }

    /// Read an IP address.
    pub fn read_ip_address(&mut self) -> Result<[u8; 4]> {
        let len = self.expect_tag(tag::application::IP_ADDRESS)?;
        if len != 4 {
            return Err(self.error(DecodeErrorKind::InvalidIpAddressLength { length: len }));
        }
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Read one complete TLV and return it (tag, length and content) without parsing.
    pub fn read_tlv(&mut self) -> Result<Bytes> {
        let start = self.offset;
        let (_, len) = self.read_header()?;
        self.offset += len;
        Ok(self.data.slice(start..self.offset))
    }

    /// Skip a TLV (tag-length-value) without parsing.
    pub fn skip_tlv(&mut self) -> Result<()> {
        self.read_tlv().map(|_| ())
    }

    /// Create a sub-decoder for a portion of the remaining data.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let content = self.read_bytes(len)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            base,
        })
    }

    /// Get remaining data as a slice.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.offset..]
    }
}

/// Drop leading octets that only repeat the sign of the next octet.
fn strip_redundant_sign_octets(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < bytes.len() {
        let redundant = match bytes[start] {
            0x00 => bytes[start + 1] & 0x80 == 0,
            0xFF => bytes[start + 1] & 0x80 != 0,
            _ => false,
        };
        if !redundant {
            break;
        }
        start += 1;
    }
    &bytes[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer() {
        let cases: &[(&[u8], i32)] = &[
            (&[0x02, 0x01, 0x00], 0),
            (&[0x02, 0x01, 0x7F], 127),
            (&[0x02, 0x02, 0x00, 0x80], 128),
            (&[0x02, 0x01, 0xFF], -1),
            (&[0x02, 0x01, 0x80], -128),
            (&[0x02, 0x02, 0xFF, 0x7F], -129),
            (&[0x02, 0x04, 0x7F, 0xFF, 0xFF, 0xFF], i32::MAX),
            (&[0x02, 0x04, 0x80, 0x00, 0x00, 0x00], i32::MIN),
        ];
        for (bytes, expected) in cases {
            let mut dec = Decoder::from_slice(bytes);
            assert_eq!(dec.read_integer().unwrap(), *expected, "{bytes:02X?}");
            assert!(dec.is_empty());
        }
    }

    #[test]
    fn test_filler_octet_tolerated() {
        // 0xFF 0x80: nine consecutive one bits, the 0xFF is filler
        let mut dec = Decoder::from_slice(&[0x02, 0x02, 0xFF, 0x80]);
        assert_eq!(dec.read_integer().unwrap(), -128);

        // Filler in front of a full four-octet value must not truncate it
        let mut dec = Decoder::from_slice(&[0x02, 0x05, 0xFF, 0x80, 0x00, 0x00, 0x00]);
        assert_eq!(dec.read_integer().unwrap(), i32::MIN);

        let mut dec = Decoder::from_slice(&[0x02, 0x05, 0x00, 0x80, 0x00, 0x00, 0x00]);
        assert_eq!(dec.read_integer().unwrap(), i32::MIN); // 0x80000000 wraps
    }

    #[test]
    fn test_accept_non_minimal_integer() {
        let mut dec = Decoder::from_slice(&[0x02, 0x02, 0x00, 0x01]);
        assert_eq!(dec.read_integer().unwrap(), 1);

        let mut dec = Decoder::from_slice(&[0x02, 0x03, 0x00, 0x00, 0x80]);
        assert_eq!(dec.read_integer().unwrap(), 128);

        let mut dec = Decoder::from_slice(&[0x02, 0x02, 0xFF, 0xFF]);
        assert_eq!(dec.read_integer().unwrap(), -1);
    }

    #[test]
    fn test_decode_unsigned32() {
        let mut dec = Decoder::from_slice(&[0x42, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(dec.read_unsigned32(tag::application::GAUGE32).unwrap(), u32::MAX);

        let mut dec = Decoder::from_slice(&[0x43, 0x01, 0x00]);
        assert_eq!(dec.read_unsigned32(tag::application::TIMETICKS).unwrap(), 0);
    }

    #[test]
    fn test_zero_length_integer_rejected() {
        let mut dec = Decoder::from_slice(&[0x02, 0x00]);
        let err = dec.read_integer().unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::ZeroLengthInteger));
    }

    #[test]
    fn test_decode_null() {
        let mut dec = Decoder::from_slice(&[0x05, 0x00]);
        dec.read_null().unwrap();

        let mut dec = Decoder::from_slice(&[0x05, 0x01, 0x00]);
        assert_eq!(
            dec.read_null().unwrap_err().decode_kind(),
            Some(DecodeErrorKind::InvalidNull)
        );
    }

    #[test]
    fn test_decode_octet_string() {
        let mut dec = Decoder::from_slice(&[0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c']);
        let s = dec.read_octet_string().unwrap();
        assert_eq!(&s[..], b"public");
    }

    #[test]
    fn test_decode_oid() {
        let mut dec = Decoder::from_slice(&[0x06, 0x03, 0x2B, 0x06, 0x01]);
        let oid = dec.read_oid().unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1]);
    }

    #[test]
    fn test_decode_sequence() {
        let mut dec = Decoder::from_slice(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
        let mut seq = dec.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), 1);
        assert_eq!(seq.offset(), 5);
        assert_eq!(seq.read_integer().unwrap(), 2);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_tag_mismatch_reports_position() {
        let mut dec = Decoder::from_slice(&[0x30, 0x03, 0x04, 0x01, 0x41]);
        let mut seq = dec.read_sequence().unwrap();
        let err = seq.read_integer().unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                offset: 2,
                kind: DecodeErrorKind::UnexpectedTag {
                    expected: 0x02,
                    actual: 0x04
                }
            }
        ));
    }

    #[test]
    fn test_declared_length_exceeds_buffer() {
        // Declares 10 content bytes, carries 3 (5 bytes total)
        let mut dec = Decoder::from_slice(&[0x04, 0x0A, 0x01, 0x02, 0x03]);
        let err = dec.read_octet_string().unwrap_err();
        assert_eq!(
            err.decode_kind(),
            Some(DecodeErrorKind::InsufficientData {
                needed: 10,
                available: 3
            })
        );
    }

    #[test]
    fn test_decode_ip_address() {
        let mut dec = Decoder::from_slice(&[0x40, 0x04, 10, 0, 0, 7]);
        assert_eq!(dec.read_ip_address().unwrap(), [10, 0, 0, 7]);

        let mut dec = Decoder::from_slice(&[0x40, 0x03, 10, 0, 0]);
        assert!(dec.read_ip_address().is_err());
    }

    #[test]
    fn test_read_tlv() {
        let mut dec = Decoder::from_slice(&[0x02, 0x01, 0x07, 0x05, 0x00]);
        assert_eq!(&dec.read_tlv().unwrap()[..], &[0x02, 0x01, 0x07]);
        assert_eq!(&dec.read_tlv().unwrap()[..], &[0x05, 0x00]);
        assert!(dec.is_empty());
    }

    #[test]
    fn test_skip_tlv_rejects_oversized_length() {
        let mut dec = Decoder::from_slice(&[0x04, 0x82, 0x01, 0x00, 0xAA, 0xBB, 0xCC]);
        let err = dec.skip_tlv().unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::TlvOverflow));
    }
}
