//! BER length encoding and decoding.
//!
//! Length encoding follows X.690 Section 8.1.3:
//! - Short form: Single byte, bit 8=0, value 0-127
//! - Long form: Initial byte (bit 8=1, bits 7-1=count), followed by length bytes
//! - Indefinite form (0x80): Rejected

use smallvec::SmallVec;

use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, Result};

/// Maximum length we'll accept.
///
/// The largest value a three-octet long-form length can carry. Roadside
/// agents answer with a few hundred bytes; this bounds what a corrupt
/// length field can make us allocate.
pub const MAX_LENGTH: usize = 0xFF_FFFF;

/// Encode a length value (returns bytes in reverse order for prepending).
///
/// Uses short form for lengths <= 127, long form otherwise.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];

    if len <= 127 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    // Low byte first, then the 0x80|count prefix last.
    let mut count = 0;
    let mut rest = len;
    while rest > 0 && count < 4 {
        buf[count] = rest as u8;
        rest >>= 8;
        count += 1;
    }
    buf[count] = 0x80 | count as u8;
    (buf, count + 1)
}

/// Encode a length value in wire order.
pub fn length_bytes(len: usize) -> SmallVec<[u8; 5]> {
    let (buf, count) = encode_length(len);
    buf[..count].iter().rev().copied().collect()
}

/// Encode a length supplied as a signed integer.
///
/// Fails with [`EncodeErrorKind::NegativeLength`] for negative input, which
/// is how lengths computed by arithmetic on untrusted fields are caught.
pub fn encode_length_checked(len: i64) -> Result<SmallVec<[u8; 5]>> {
    if len < 0 {
        return Err(Error::encode(EncodeErrorKind::NegativeLength(len)));
    }
    Ok(length_bytes(len as usize))
}

/// Number of bytes the length field for `len` occupies.
pub fn length_encoded_len(len: usize) -> usize {
    encode_length(len).1
}

/// Decode a length from bytes, returning (length, bytes_consumed).
///
/// The `base_offset` parameter is used to report error offsets correctly
/// when this is called from within a decoder.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    if first == 0x80 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::IndefiniteLength,
        ));
    }

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let num_octets = (first & 0x7F) as usize;

    if num_octets > 4 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthTooLong { octets: num_octets },
        ));
    }

    if data.len() < 1 + num_octets {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    }

    let len = data[1..=num_octets]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);

    if len > MAX_LENGTH {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthExceedsMax {
                length: len,
                max: MAX_LENGTH,
            },
        ));
    }

    Ok((len, 1 + num_octets))
}

/// Check the tag at the front of `data`, then decode the length that follows.
///
/// Returns (length, bytes_consumed) where the consumed count includes the tag.
pub fn decode_tagged_length(data: &[u8], base_offset: usize, expected: u8) -> Result<(usize, usize)> {
    let Some(&actual) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };
    if actual != expected {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::UnexpectedTag { expected, actual },
        ));
    }
    let (len, consumed) = decode_length(&data[1..], base_offset + 1)?;
    Ok((len, consumed + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form() {
        assert_eq!(decode_length(&[0], 0).unwrap(), (0, 1));
        assert_eq!(decode_length(&[127], 0).unwrap(), (127, 1));
        assert_eq!(decode_length(&[1], 0).unwrap(), (1, 1));
    }

    #[test]
    fn test_long_form() {
        assert_eq!(decode_length(&[0x81, 128], 0).unwrap(), (128, 2));
        assert_eq!(decode_length(&[0x81, 255], 0).unwrap(), (255, 2));
        assert_eq!(decode_length(&[0x82, 0x01, 0x00], 0).unwrap(), (256, 3));
        assert_eq!(decode_length(&[0x82, 0xFF, 0xFF], 0).unwrap(), (65535, 3));
    }

    #[test]
    fn test_indefinite_rejected() {
        let err = decode_length(&[0x80], 7).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                offset: 7,
                kind: DecodeErrorKind::IndefiniteLength
            }
        ));
    }

    #[test]
    fn test_truncated_long_form() {
        assert!(decode_length(&[0x82, 0x01], 0).is_err());
        assert!(decode_length(&[], 0).is_err());
    }

    #[test]
    fn test_encode_wire_order() {
        assert_eq!(length_bytes(0).as_slice(), &[0]);
        assert_eq!(length_bytes(127).as_slice(), &[127]);
        assert_eq!(length_bytes(128).as_slice(), &[0x81, 0x80]);
        assert_eq!(length_bytes(256).as_slice(), &[0x82, 0x01, 0x00]);
        assert_eq!(length_bytes(0x010000).as_slice(), &[0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_reverse_order() {
        let (buf, len) = encode_length(128);
        assert_eq!(&buf[..len], &[128, 0x81]);

        let (buf, len) = encode_length(256);
        assert_eq!(&buf[..len], &[0, 1, 0x82]);
    }

    #[test]
    fn test_negative_length_rejected() {
        let err = encode_length_checked(-1).unwrap_err();
        assert!(matches!(
            err,
            Error::Encode {
                kind: EncodeErrorKind::NegativeLength(-1)
            }
        ));
        assert_eq!(encode_length_checked(300).unwrap().as_slice(), &[0x82, 0x01, 0x2C]);
    }

    #[test]
    fn test_accept_non_minimal_length() {
        assert_eq!(decode_length(&[0x82, 0x00, 0x05], 0).unwrap(), (5, 3));
        assert_eq!(decode_length(&[0x81, 0x01], 0).unwrap(), (1, 2));
    }

    #[test]
    fn test_tagged_length() {
        assert_eq!(decode_tagged_length(&[0x30, 0x03], 0, 0x30).unwrap(), (3, 2));
        let err = decode_tagged_length(&[0x02, 0x03], 4, 0x30).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                offset: 4,
                kind: DecodeErrorKind::UnexpectedTag {
                    expected: 0x30,
                    actual: 0x02
                }
            }
        ));
    }

    #[test]
    fn test_max_length_enforced() {
        let over = MAX_LENGTH + 1;
        let bytes = [
            0x84,
            (over >> 24) as u8,
            (over >> 16) as u8,
            (over >> 8) as u8,
            over as u8,
        ];
        let err = decode_length(&bytes, 0).unwrap_err();
        assert!(matches!(
            err.decode_kind(),
            Some(DecodeErrorKind::LengthExceedsMax { .. })
        ));
    }
}
