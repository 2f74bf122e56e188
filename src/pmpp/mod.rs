//! PMPP (Point-to-Multi-Point Protocol) link framing.
//!
//! NTCIP devices on shared serial or radio links wrap each SNMP message in an
//! HDLC-style frame:
//!
//! ```text
//! 7E | stuffed(address control protocol-id payload FCS) | 7E
//! ```
//!
//! Inside the stuffed region `7E` is sent as `7D 5E` and `7D` as `7D 5D`.
//! The FCS is the 16-bit HDLC frame check sequence, sent low byte first.
//!
//! A frame check mismatch is not an error. [`decode`] reports it in
//! [`Unframed::fcs`] and still returns the payload; the session layer retries
//! on timeout, so counting a bad frame as both an error and a timeout would
//! double-count one failure. Keep a [`LinkStats`] per link to tally them.

pub mod codec;

use bytes::{BufMut, Bytes, BytesMut};
use crc::{CRC_16_IBM_SDLC, Crc};

use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, HdlcFieldKind, Result};

/// Frame delimiter.
pub const FLAG: u8 = 0x7E;
/// Escape byte.
pub const ESCAPE: u8 = 0x7D;
/// Second byte of an escaped delimiter (`7D 5E`).
pub const ESCAPED_FLAG: u8 = 0x5E;
/// Second byte of an escaped escape (`7D 5D`).
pub const ESCAPED_ESCAPE: u8 = 0x5D;

/// Smallest unstuffed frame body: address, control, protocol id and a 2-byte FCS.
pub const MIN_FRAME_BODY: usize = 5;

const FCS: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// HDLC frame check sequence (CRC-16/X-25) over `data`.
pub fn fcs16(data: &[u8]) -> u16 {
    FCS.checksum(data)
}

/// A variable-length HDLC field (address or protocol identifier) of 1 or 2 bytes.
///
/// On the wire the field ends at the first byte whose low bit is 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HdlcField {
    bytes: [u8; 2],
    len: u8,
}

impl HdlcField {
    /// A one-byte field. The low bit of `byte` should be set; use
    /// [`from_slice`](Self::from_slice) to check.
    pub const fn single(byte: u8) -> Self {
        Self {
            bytes: [byte, 0],
            len: 1,
        }
    }

    /// A two-byte field. The low bit of `first` should be clear and that of
    /// `second` set.
    pub const fn pair(first: u8, second: u8) -> Self {
        Self {
            bytes: [first, second],
            len: 2,
        }
    }

    /// Build from a slice of 1 or 2 bytes whose extension bits match its
    /// length, so the field decodes back to the same bytes.
    pub fn from_slice(field: HdlcFieldKind, bytes: &[u8]) -> Result<Self> {
        let extension = || Error::encode(EncodeErrorKind::HdlcFieldExtension { field });
        match *bytes {
            [b] if b & 0x01 == 0 => Err(extension()),
            [b] => Ok(Self::single(b)),
            [a, b] if a & 0x01 != 0 || b & 0x01 == 0 => Err(extension()),
            [a, b] => Ok(Self::pair(a, b)),
            _ => Err(Error::encode(EncodeErrorKind::HdlcFieldLength {
                field,
                length: bytes.len(),
            })),
        }
    }

    /// The field bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Read a field from the front of `data`: bytes up to and including the
    /// first with its low bit set, at most two. Returns the field and its length.
    fn parse(data: &[u8]) -> Option<(Self, usize)> {
        match *data {
            [a, ..] if a & 0x01 != 0 => Some((Self::single(a), 1)),
            [a, b, ..] => Some((Self::pair(a, b), 2)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for HdlcField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HdlcField(")?;
        for (i, b) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        write!(f, ")")
    }
}

/// Addressing for one station on a PMPP multidrop link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PmppEndPoint {
    pub address: HdlcField,
    pub control: u8,
    pub protocol_identifier: HdlcField,
}

impl PmppEndPoint {
    /// NTCIP default: address `05`, control `03` (UI frame), protocol id `C1` (SNMP).
    pub const NTCIP_DEFAULT: Self = Self {
        address: HdlcField::single(0x05),
        control: 0x03,
        protocol_identifier: HdlcField::single(0xC1),
    };

    /// Build an endpoint, checking that address and protocol id are 1 or 2
    /// bytes with the low bit set on the last byte only.
    pub fn new(address: &[u8], control: u8, protocol_identifier: &[u8]) -> Result<Self> {
        Ok(Self {
            address: HdlcField::from_slice(HdlcFieldKind::Address, address)?,
            control,
            protocol_identifier: HdlcField::from_slice(
                HdlcFieldKind::ProtocolIdentifier,
                protocol_identifier,
            )?,
        })
    }

    fn header_len(&self) -> usize {
        self.address.as_bytes().len() + 1 + self.protocol_identifier.as_bytes().len()
    }
}

impl Default for PmppEndPoint {
    fn default() -> Self {
        Self::NTCIP_DEFAULT
    }
}

/// HDLC header fields recovered from a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmppHeader {
    pub address: HdlcField,
    pub control: u8,
    pub protocol_identifier: HdlcField,
}

impl PmppHeader {
    /// The station these fields address.
    pub fn endpoint(&self) -> PmppEndPoint {
        PmppEndPoint {
            address: self.address,
            control: self.control,
            protocol_identifier: self.protocol_identifier,
        }
    }
}

/// Outcome of the frame check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FcsStatus {
    /// FCS matched.
    Valid,
    /// FCS did not match; the payload is probably corrupt.
    Invalid { received: u16, computed: u16 },
    /// No frame was found, so nothing was checked.
    Absent,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unframed {
    /// Parsed HDLC fields, `None` when the input held no frame.
    pub header: Option<PmppHeader>,
    /// Information field, or the whole unstuffed body when HDLC fields were kept.
    pub payload: Bytes,
    pub fcs: FcsStatus,
}

impl Unframed {
    /// True if the frame check sequence did not match.
    pub fn crc_error(&self) -> bool {
        matches!(self.fcs, FcsStatus::Invalid { .. })
    }
}

/// Per-link frame counters.
///
/// The codec never touches shared state; callers fold each [`Unframed`]
/// into the stats of the link it arrived on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames decoded.
    pub frames: u64,
    /// Frames whose FCS did not match.
    pub crc_errors: u64,
    /// Inputs that held no frame delimiters.
    pub unframed: u64,
}

impl LinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one decode result.
    pub fn record(&mut self, unframed: &Unframed) {
        match unframed.fcs {
            FcsStatus::Valid => self.frames += 1,
            FcsStatus::Invalid { .. } => {
                self.frames += 1;
                self.crc_errors += 1;
            }
            FcsStatus::Absent => self.unframed += 1,
        }
    }
}

/// Frame `payload` for `endpoint`.
pub fn encode(payload: &[u8], endpoint: &PmppEndPoint) -> Bytes {
    let body_len = endpoint.header_len() + payload.len() + 2;
    let mut body = Vec::with_capacity(body_len);
    body.extend_from_slice(endpoint.address.as_bytes());
    body.push(endpoint.control);
    body.extend_from_slice(endpoint.protocol_identifier.as_bytes());
    body.extend_from_slice(payload);
    let fcs = fcs16(&body);
    body.extend_from_slice(&fcs.to_le_bytes());

    let mut frame = BytesMut::with_capacity(body_len + stuffed_extra(&body) + 2);
    frame.put_u8(FLAG);
    stuff_into(&body, &mut frame);
    frame.put_u8(FLAG);
    frame.freeze()
}

/// Frame `payload` from raw field bytes.
///
/// Fails if the address or protocol identifier is not 1 or 2 bytes.
pub fn encode_with_fields(
    payload: &[u8],
    address: &[u8],
    control: u8,
    protocol_identifier: &[u8],
) -> Result<Bytes> {
    let endpoint = PmppEndPoint::new(address, control, protocol_identifier)?;
    Ok(encode(payload, &endpoint))
}

/// Unframe one PMPP frame.
///
/// Noise before the first and after the last `7E` is ignored. Input without
/// a frame (fewer than two delimiters) is returned unchanged with
/// [`FcsStatus::Absent`]. With `include_hdlc_fields` the payload keeps the
/// address, control and protocol id bytes in front.
pub fn decode(data: &[u8], include_hdlc_fields: bool) -> Result<Unframed> {
    let (Some(first), Some(last)) = (
        data.iter().position(|&b| b == FLAG),
        data.iter().rposition(|&b| b == FLAG),
    ) else {
        return Ok(passthrough(data));
    };
    if first == last {
        return Ok(passthrough(data));
    }

    let body = unstuff(&data[first + 1..last]);
    if body.len() < MIN_FRAME_BODY {
        tracing::debug!(target: "ntcip_snmp::pmpp", { pmpp.length = body.len() }, "frame too short");
        return Err(Error::decode(
            first,
            DecodeErrorKind::ShortFrame { length: body.len() },
        ));
    }

    let fcs_at = body.len() - 2;
    let received = u16::from_le_bytes([body[fcs_at], body[fcs_at + 1]]);
    let computed = fcs16(&body[..fcs_at]);
    let fcs = if received == computed {
        FcsStatus::Valid
    } else {
        tracing::warn!(target: "ntcip_snmp::pmpp", { pmpp.received = received, pmpp.computed = computed }, "frame check sequence mismatch");
        FcsStatus::Invalid { received, computed }
    };

    let content = &body[..fcs_at];
    let (header, header_len) = parse_header(content).ok_or_else(|| {
        Error::decode(
            first,
            DecodeErrorKind::ShortFrame {
                length: body.len(),
            },
        )
    })?;

    let mut body = Bytes::from(body);
    body.truncate(fcs_at);
    let payload = if include_hdlc_fields {
        body
    } else {
        body.slice(header_len..)
    };

    tracing::trace!(target: "ntcip_snmp::pmpp", { pmpp.payload_len = payload.len(), pmpp.fcs_ok = !matches!(fcs, FcsStatus::Invalid { .. }) }, "frame decoded");
    Ok(Unframed {
        header: Some(header),
        payload,
        fcs,
    })
}

/// [`decode`], counting the result into `stats`.
pub fn decode_counted(
    data: &[u8],
    include_hdlc_fields: bool,
    stats: &mut LinkStats,
) -> Result<Unframed> {
    let unframed = decode(data, include_hdlc_fields)?;
    stats.record(&unframed);
    Ok(unframed)
}

fn passthrough(data: &[u8]) -> Unframed {
    Unframed {
        header: None,
        payload: Bytes::copy_from_slice(data),
        fcs: FcsStatus::Absent,
    }
}

fn parse_header(content: &[u8]) -> Option<(PmppHeader, usize)> {
    let (address, mut pos) = HdlcField::parse(content)?;
    let control = *content.get(pos)?;
    pos += 1;
    let (protocol_identifier, pid_len) = HdlcField::parse(&content[pos..])?;
    pos += pid_len;
    Some((
        PmppHeader {
            address,
            control,
            protocol_identifier,
        },
        pos,
    ))
}

fn stuffed_extra(data: &[u8]) -> usize {
    data.iter().filter(|&&b| b == FLAG || b == ESCAPE).count()
}

/// Escape delimiter and escape bytes.
pub fn stuff(data: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(data.len() + stuffed_extra(data));
    stuff_into(data, &mut out);
    out.freeze()
}

fn stuff_into(data: &[u8], out: &mut BytesMut) {
    if stuffed_extra(data) == 0 {
        out.extend_from_slice(data);
        return;
    }
    for &b in data {
        match b {
            FLAG => out.put_slice(&[ESCAPE, ESCAPED_FLAG]),
            ESCAPE => out.put_slice(&[ESCAPE, ESCAPED_ESCAPE]),
            other => out.put_u8(other),
        }
    }
}

/// Reverse [`stuff`]. A `7D` not followed by `5E` or `5D` is kept as is.
pub fn unstuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        match (data[i], data.get(i + 1)) {
            (ESCAPE, Some(&ESCAPED_FLAG)) => {
                out.push(FLAG);
                i += 2;
            }
            (ESCAPE, Some(&ESCAPED_ESCAPE)) => {
                out.push(ESCAPE);
                i += 2;
            }
            (b, _) => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRICKY: [u8; 4] = [0x7E, 0x01, 0x7D, 0x02];

    #[test]
    fn test_fcs16_check_value() {
        // CRC-16/X-25 check value
        assert_eq!(fcs16(b"123456789"), 0x906E);
    }

    #[test]
    fn test_encode_layout() {
        let frame = encode(&[0x30, 0x00], &PmppEndPoint::NTCIP_DEFAULT);
        assert_eq!(frame[0], FLAG);
        assert_eq!(frame[frame.len() - 1], FLAG);
        assert_eq!(&frame[1..6], &[0x05, 0x03, 0xC1, 0x30, 0x00]);

        let fcs = fcs16(&[0x05, 0x03, 0xC1, 0x30, 0x00]).to_le_bytes();
        // FCS bytes may themselves be stuffed; this input avoids that
        if !fcs.contains(&FLAG) && !fcs.contains(&ESCAPE) {
            assert_eq!(&frame[6..8], &fcs);
            assert_eq!(frame.len(), 9);
        }
    }

    #[test]
    fn test_stuffing() {
        assert_eq!(&stuff(&TRICKY)[..], &[0x7D, 0x5E, 0x01, 0x7D, 0x5D, 0x02]);
        assert_eq!(unstuff(&stuff(&TRICKY)), TRICKY);
        assert_eq!(&stuff(&[0x01, 0x02])[..], &[0x01, 0x02]);
        // Unknown escape sequence passes through
        assert_eq!(unstuff(&[0x7D, 0x41]), vec![0x7D, 0x41]);
    }

    #[test]
    fn test_roundtrip_with_reserved_bytes() {
        let payloads: [&[u8]; 5] = [
            &[],
            &[0x01, 0x02, 0x03],
            &[0x7E],
            &[0x7D],
            &TRICKY,
        ];
        for payload in payloads {
            let frame = encode(payload, &PmppEndPoint::NTCIP_DEFAULT);
            // Only the outer delimiters may appear unescaped
            assert_eq!(frame.iter().filter(|&&b| b == FLAG).count(), 2);

            let unframed = decode(&frame, false).unwrap();
            assert_eq!(&unframed.payload[..], payload);
            assert_eq!(unframed.fcs, FcsStatus::Valid);
            assert_eq!(
                unframed.header.map(|h| h.endpoint()),
                Some(PmppEndPoint::NTCIP_DEFAULT)
            );
        }
    }

    #[test]
    fn test_decode_keeps_hdlc_fields() {
        let frame = encode(&TRICKY, &PmppEndPoint::NTCIP_DEFAULT);
        let unframed = decode(&frame, true).unwrap();
        assert_eq!(&unframed.payload[..3], &[0x05, 0x03, 0xC1]);
        assert_eq!(&unframed.payload[3..], &TRICKY);
    }

    #[test]
    fn test_two_byte_fields() {
        // Address 0x02 has low bit clear, so the field continues into 0x03
        let endpoint = PmppEndPoint::new(&[0x02, 0x03], 0x13, &[0x80, 0xC1]).unwrap();
        let frame = encode(&[0xAA], &endpoint);
        let unframed = decode(&frame, false).unwrap();
        let header = unframed.header.unwrap();
        assert_eq!(header.address.as_bytes(), &[0x02, 0x03]);
        assert_eq!(header.control, 0x13);
        assert_eq!(header.protocol_identifier.as_bytes(), &[0x80, 0xC1]);
        assert_eq!(&unframed.payload[..], &[0xAA]);
    }

    #[test]
    fn test_oversized_fields_rejected() {
        let err = encode_with_fields(&[], &[0x00, 0x00, 0x01], 0x03, &[0xC1]).unwrap_err();
        assert!(matches!(
            err,
            Error::Encode {
                kind: EncodeErrorKind::HdlcFieldLength {
                    field: HdlcFieldKind::Address,
                    length: 3
                }
            }
        ));
        assert!(encode_with_fields(&[], &[0x05], 0x03, &[]).is_err());
    }

    #[test]
    fn test_field_extension_bits_checked() {
        let rejected = |address: &[u8], pid: &[u8]| match PmppEndPoint::new(address, 0x03, pid) {
            Err(Error::Encode {
                kind: EncodeErrorKind::HdlcFieldExtension { field },
            }) => Some(field),
            _ => None,
        };

        // Single byte that would continue into the control byte
        assert_eq!(rejected(&[0x04], &[0xC1]), Some(HdlcFieldKind::Address));
        // Pair whose first byte already ends the field
        assert_eq!(rejected(&[0x05, 0x03], &[0xC1]), Some(HdlcFieldKind::Address));
        // Pair that never ends
        assert_eq!(
            rejected(&[0x05], &[0x80, 0xC0]),
            Some(HdlcFieldKind::ProtocolIdentifier)
        );
        assert!(encode_with_fields(&[0xAA, 0xBB], &[0x04], 0x03, &[0xC1]).is_err());
    }

    #[test]
    fn test_bit_flip_counts_crc_error() {
        let frame = encode(&[0x30, 0x03, 0x02, 0x01, 0x00], &PmppEndPoint::NTCIP_DEFAULT);
        let mut corrupted = frame.to_vec();
        // Payload starts after 7E 05 03 C1
        corrupted[5] ^= 0x01;

        let mut stats = LinkStats::new();
        let unframed = decode_counted(&corrupted, false, &mut stats).unwrap();
        assert!(unframed.crc_error());
        assert_eq!(&unframed.payload[..], &[0x30, 0x02, 0x02, 0x01, 0x00]);
        assert_eq!(stats.crc_errors, 1);
        assert_eq!(stats.frames, 1);
    }

    #[test]
    fn test_noise_around_frame_ignored() {
        let frame = encode(&[0x01], &PmppEndPoint::NTCIP_DEFAULT);
        let mut noisy = vec![0x00, 0xFF];
        noisy.extend_from_slice(&frame);
        noisy.push(0x42);
        let unframed = decode(&noisy, false).unwrap();
        assert_eq!(&unframed.payload[..], &[0x01]);
        assert!(!unframed.crc_error());
    }

    #[test]
    fn test_no_frame_passthrough() {
        let mut stats = LinkStats::new();
        let unframed = decode_counted(&[0x30, 0x00], false, &mut stats).unwrap();
        assert_eq!(unframed.fcs, FcsStatus::Absent);
        assert!(unframed.header.is_none());
        assert_eq!(&unframed.payload[..], &[0x30, 0x00]);

        let single = decode(&[0x01, 0x7E, 0x02], false).unwrap();
        assert_eq!(&single.payload[..], &[0x01, 0x7E, 0x02]);
        assert_eq!(stats.unframed, 1);
    }

    #[test]
    fn test_short_frame_is_error() {
        let err = decode(&[0x7E, 0x05, 0x03, 0x7E], false).unwrap_err();
        assert!(matches!(
            err.decode_kind(),
            Some(DecodeErrorKind::ShortFrame { length: 2 })
        ));
    }
}
