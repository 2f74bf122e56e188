//! BER encoding.
//!
//! Uses a reverse buffer approach: writes from end backwards to avoid
//! needing to pre-calculate lengths.

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use bytes::Bytes;

/// Buffer for BER encoding that writes backwards.
///
/// This approach avoids needing to pre-calculate content lengths:
/// we write the content first, then prepend the length and tag.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Prepend bytes that are given in wire order.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Push a BER length encoding.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, count) = encode_length(len);
        // encode_length already yields the bytes in prepend order
        self.buf.extend_from_slice(&bytes[..count]);
    }

    /// Push a BER tag.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Get the current length of encoded data.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a primitive TLV from its tag and content octets.
    pub fn push_tlv(&mut self, tag: u8, content: &[u8]) {
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag);
    }

    /// Encode a constructed type (SEQUENCE, PDU, etc).
    ///
    /// Calls the closure to encode contents, then wraps with length and tag.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let start_len = self.len();
        f(self);
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Encode an INTEGER.
    pub fn push_integer(&mut self, value: i32) {
        let (arr, len) = encode_integer_stack(value);
        self.push_tlv(tag::universal::INTEGER, &arr[4 - len..]);
    }

    /// Encode a 64-bit unsigned integer (Counter64).
    pub fn push_integer64(&mut self, value: u64) {
        let (arr, len) = encode_integer64_stack(value);
        self.push_tlv(tag::application::COUNTER64, &arr[9 - len..]);
    }

    /// Encode an unsigned 32-bit integer with a specific tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let (arr, len) = encode_unsigned32_stack(value);
        self.push_tlv(tag, &arr[5 - len..]);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_tlv(tag::universal::OCTET_STRING, data);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_tlv(tag::universal::NULL, &[]);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &Oid) {
        self.push_tlv(tag::universal::OBJECT_IDENTIFIER, &oid.to_ber());
    }

    /// Encode an IP address.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_tlv(tag::application::IP_ADDRESS, &addr);
    }

    /// Finalize and return the encoded bytes.
    ///
    /// The buffer is reversed to produce the correct order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }

    /// Finalize and return as `Vec<u8>`.
    pub fn finish_vec(mut self) -> Vec<u8> {
        self.buf.reverse();
        self.buf
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_with(f: impl FnOnce(&mut EncodeBuf)) -> Bytes {
    let mut buf = EncodeBuf::with_capacity(16);
    f(&mut buf);
    buf.finish()
}

/// Encode a complete INTEGER TLV.
pub fn encode_integer32(value: i32) -> Bytes {
    encode_with(|buf| buf.push_integer(value))
}

/// Encode a complete unsigned TLV (Gauge32 / UInteger32 unless `tag` says otherwise).
pub fn encode_unsigned32(tag: u8, value: u32) -> Bytes {
    encode_with(|buf| buf.push_unsigned32(tag, value))
}

/// Encode a complete OCTET STRING TLV.
pub fn encode_octet_string(data: &[u8]) -> Bytes {
    encode_with(|buf| buf.push_octet_string(data))
}

/// Encode a complete OBJECT IDENTIFIER TLV.
pub fn encode_oid(oid: &Oid) -> Bytes {
    encode_with(|buf| buf.push_oid(oid))
}

/// Encode a NULL TLV (`05 00`).
pub fn encode_null() -> Bytes {
    encode_with(|buf| buf.push_null())
}

/// Encode an IpAddress TLV.
pub fn encode_ip_address(addr: [u8; 4]) -> Bytes {
    encode_with(|buf| buf.push_ip_address(addr))
}

/// Encode a signed 32-bit integer in minimal BER form.
///
/// Returns a stack-allocated array and the number of valid bytes.
/// The valid bytes are at the END of the array.
#[inline]
fn encode_integer_stack(value: i32) -> ([u8; 4], usize) {
    let bytes = value.to_be_bytes();

    // Drop a leading octet while the next one still carries the sign
    let mut start = 0;
    if value >= 0 {
        while start < 3 && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else {
        while start < 3 && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }

    (bytes, 4 - start)
}

/// Encode an unsigned 32-bit integer.
///
/// A `0x00` guard octet is kept when the top bit of the first significant
/// octet is set, so a signed reader does not see a negative number.
#[inline]
fn encode_unsigned32_stack(value: u32) -> ([u8; 5], usize) {
    let mut result = [0u8; 5];
    result[1..].copy_from_slice(&value.to_be_bytes());

    let significant = (4 - value.leading_zeros() as usize / 8).max(1);
    let guard = usize::from(result[5 - significant] & 0x80 != 0);
    (result, significant + guard)
}

/// Encode an unsigned 64-bit integer, same rules as [`encode_unsigned32_stack`].
#[inline]
fn encode_integer64_stack(value: u64) -> ([u8; 9], usize) {
    let mut result = [0u8; 9];
    result[1..].copy_from_slice(&value.to_be_bytes());

    let significant = (8 - value.leading_zeros() as usize / 8).max(1);
    let guard = usize::from(result[9 - significant] & 0x80 != 0);
    (result, significant + guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer_content(value: i32) -> Vec<u8> {
        let (arr, len) = encode_integer_stack(value);
        arr[4 - len..].to_vec()
    }

    fn unsigned32_content(value: u32) -> Vec<u8> {
        let (arr, len) = encode_unsigned32_stack(value);
        arr[5 - len..].to_vec()
    }

    #[test]
    fn test_encode_integer() {
        assert_eq!(integer_content(0), vec![0]);
        assert_eq!(integer_content(1), vec![1]);
        assert_eq!(integer_content(127), vec![127]);
        assert_eq!(integer_content(128), vec![0, 128]);
        assert_eq!(integer_content(-1), vec![0xFF]);
        assert_eq!(integer_content(-128), vec![0x80]);
        assert_eq!(integer_content(-129), vec![0xFF, 0x7F]);
        assert_eq!(integer_content(i32::MAX), vec![0x7F, 0xFF, 0xFF, 0xFF]);
        assert_eq!(integer_content(i32::MIN), vec![0x80, 0, 0, 0]);
    }

    #[test]
    fn test_encode_unsigned32() {
        assert_eq!(unsigned32_content(0), vec![0]);
        assert_eq!(unsigned32_content(127), vec![127]);
        assert_eq!(unsigned32_content(128), vec![0, 128]);
        assert_eq!(unsigned32_content(255), vec![0, 255]);
        assert_eq!(unsigned32_content(256), vec![1, 0]);
        assert_eq!(unsigned32_content(u32::MAX), vec![0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_counter64() {
        let bytes = encode_with(|buf| buf.push_integer64(u64::MAX));
        assert_eq!(
            &bytes[..],
            &[0x46, 0x09, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        let bytes = encode_with(|buf| buf.push_integer64(0));
        assert_eq!(&bytes[..], &[0x46, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_null() {
        assert_eq!(&encode_null()[..], &[0x05, 0x00]);
    }

    #[test]
    fn test_encode_integer_value() {
        assert_eq!(&encode_integer32(42)[..], &[0x02, 0x01, 0x2A]);
    }

    #[test]
    fn test_encode_ip_address() {
        assert_eq!(
            &encode_ip_address([192, 168, 0, 10])[..],
            &[0x40, 0x04, 192, 168, 0, 10]
        );
    }

    #[test]
    fn test_encode_long_octet_string() {
        let data = vec![b'A'; 200];
        let bytes = encode_octet_string(&data);
        assert_eq!(&bytes[..3], &[0x04, 0x81, 200]);
        assert_eq!(bytes.len(), 203);
    }

    #[test]
    fn test_encode_sequence() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            // Reverse buffer: push in reverse order for forward output
            buf.push_integer(2);
            buf.push_integer(1);
        });
        let bytes = buf.finish();
        assert_eq!(
            &bytes[..],
            &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]
        );
    }
}
