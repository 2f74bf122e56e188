//! Variable binding type.
//!
//! A [`Variable`] pairs an OID with a type code and the raw content octets of
//! its value. The tag and length are not stored; [`Variable::to_bytes`]
//! rebuilds the TLV on demand, and the typed accessors decode it again.

use std::net::Ipv4Addr;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::ber::{Decoder, EncodeBuf, SnmpType, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;

/// One SNMP variable binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// The object identifier.
    pub identifier: Oid,
    /// The type code (tag byte) of the value.
    pub type_code: SnmpType,
    /// Content octets of the value, without tag or length.
    pub value: Bytes,
}

impl Variable {
    /// Create a variable from its parts.
    pub fn new(identifier: Oid, type_code: SnmpType, value: impl Into<Bytes>) -> Self {
        Self {
            identifier,
            type_code,
            value: value.into(),
        }
    }

    /// Create a variable with a NULL value (for GET requests).
    pub fn null(identifier: Oid) -> Self {
        Self::from_encoded(identifier, |buf| buf.push_null())
    }

    /// Create an INTEGER variable.
    pub fn integer32(identifier: Oid, value: i32) -> Self {
        Self::from_encoded(identifier, |buf| buf.push_integer(value))
    }

    /// Create an unsigned variable (Gauge32 / UInteger32).
    pub fn uinteger32(identifier: Oid, value: u32) -> Self {
        Self::unsigned32(identifier, SnmpType::Gauge32, value)
    }

    /// Create an unsigned variable with an explicit type (Counter32, Gauge32, TimeTicks).
    pub fn unsigned32(identifier: Oid, type_code: SnmpType, value: u32) -> Self {
        Self::from_encoded(identifier, |buf| buf.push_unsigned32(type_code.tag(), value))
    }

    /// Create an OCTET STRING variable.
    pub fn octet_string(identifier: Oid, value: impl AsRef<[u8]>) -> Self {
        Self::from_encoded(identifier, |buf| buf.push_octet_string(value.as_ref()))
    }

    /// Create an OBJECT IDENTIFIER variable.
    ///
    /// Fails if `value` breaks the X.690 arc rules, since it could not be
    /// encoded faithfully.
    pub fn object_identifier(identifier: Oid, value: &Oid) -> Result<Self> {
        Ok(Self::new(
            identifier,
            SnmpType::ObjectIdentifier,
            Bytes::copy_from_slice(&value.to_ber_checked()?),
        ))
    }

    /// Create an IpAddress variable.
    pub fn ip_address(identifier: Oid, addr: Ipv4Addr) -> Self {
        Self::new(
            identifier,
            SnmpType::IpAddress,
            Bytes::copy_from_slice(&addr.octets()),
        )
    }

    /// Build through the encoder, then decode the TLV back into type and
    /// content, so a factory only yields values the decoder accepts.
    fn from_encoded(identifier: Oid, f: impl FnOnce(&mut EncodeBuf)) -> Self {
        let mut buf = EncodeBuf::with_capacity(16);
        f(&mut buf);
        let tlv = buf.finish();
        match read_value(&mut Decoder::new(tlv.clone())) {
            Ok((type_code, value)) => Self::new(identifier, type_code, value),
            Err(err) => {
                tracing::error!(target: "ntcip_snmp::ber", { error = %err }, "encoded value failed to decode");
                Self::new(identifier, SnmpType::from_tag(tlv[0]), tlv.slice(2.min(tlv.len())..))
            }
        }
    }

    /// Check that the identifier can be encoded faithfully.
    pub fn validate(&self) -> Result<()> {
        self.identifier.validate_all()
    }

    /// Parse a variable from raw bytes.
    ///
    /// Accepts, in order of detection:
    /// - a binding `SEQUENCE { OID, value }`,
    /// - an OID TLV immediately followed by a value TLV,
    /// - a lone value TLV (the identifier is left empty).
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        match decoder.peek_tag() {
            Some(tag::universal::SEQUENCE) => Self::decode(&mut decoder),
            Some(tag::universal::OBJECT_IDENTIFIER) => {
                let identifier = decoder.read_oid()?;
                let (type_code, value) = read_value(&mut decoder)?;
                Ok(Self::new(identifier, type_code, value))
            }
            _ => {
                let (type_code, value) = read_value(&mut decoder)?;
                Ok(Self::new(Oid::empty(), type_code, value))
            }
        }
    }

    /// The value as a complete TLV (tag, length, content). The OID is not included.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = EncodeBuf::with_capacity(self.value.len() + 6);
        self.encode_value(&mut buf);
        buf.finish()
    }

    /// The binding as `SEQUENCE { OID, value }`.
    pub fn to_sequence(&self) -> Bytes {
        self.to_sequence_with_tag(tag::universal::SEQUENCE)
    }

    /// The binding wrapped in a caller-chosen constructed tag.
    pub fn to_sequence_with_tag(&self, outer_tag: u8) -> Bytes {
        let mut buf = EncodeBuf::with_capacity(self.value.len() + 32);
        self.encode_with_tag(&mut buf, outer_tag);
        buf.finish()
    }

    fn encode_value(&self, buf: &mut EncodeBuf) {
        buf.push_tlv(self.type_code.tag(), &self.value);
    }

    fn encode_with_tag(&self, buf: &mut EncodeBuf, outer_tag: u8) {
        buf.push_constructed(outer_tag, |buf| {
            self.encode_value(buf);
            buf.push_oid(&self.identifier);
        });
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        self.encode_with_tag(buf, tag::universal::SEQUENCE);
    }

    /// Decode one binding `SEQUENCE { OID, value }` at the decoder's position.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;
        let identifier = seq.read_oid()?;
        let (type_code, value) = read_value(&mut seq)?;
        Ok(Self::new(identifier, type_code, value))
    }

    /// True for noSuchObject, noSuchInstance and endOfMibView.
    pub fn is_exception(&self) -> bool {
        self.type_code.is_exception()
    }

    /// Re-decode the value TLV, accepting only the listed type codes.
    fn value_decoder(&self, accepted: &[SnmpType]) -> Result<(Decoder, usize)> {
        if !accepted.contains(&self.type_code) {
            let expected = accepted.first().map_or(0, |t| t.tag());
            return Err(Error::decode(
                0,
                DecodeErrorKind::UnexpectedTag {
                    expected,
                    actual: self.type_code.tag(),
                },
            ));
        }
        let mut decoder = Decoder::new(self.to_bytes());
        let (_, len) = decoder.read_header()?;
        Ok((decoder, len))
    }

    /// Value as a signed integer.
    ///
    /// INTEGER and the unsigned application types are accepted; the content
    /// octets are read as two's complement.
    pub fn to_i32(&self) -> Result<i32> {
        let (mut decoder, len) = self.value_decoder(&INTEGER_TYPES)?;
        decoder.read_integer_value(len)
    }

    /// Value as an unsigned integer.
    ///
    /// Content octets are read as an unsigned big-endian number whatever
    /// the integer type, so an INTEGER `-1` (`0xFF`) reads as 255.
    pub fn to_u32(&self) -> Result<u32> {
        let (mut decoder, len) = self.value_decoder(&INTEGER_TYPES)?;
        decoder.read_unsigned32_value(len)
    }

    /// Value as a 64-bit unsigned integer (Counter64 or any 32-bit integer type).
    pub fn to_u64(&self) -> Result<u64> {
        if self.type_code == SnmpType::Counter64 {
            let (mut decoder, len) = self.value_decoder(&[SnmpType::Counter64])?;
            return decoder.read_integer64_value(len);
        }
        self.to_u32().map(u64::from)
    }

    /// Value as an IPv4 address.
    pub fn to_ip_address(&self) -> Result<Ipv4Addr> {
        self.value_decoder(&[SnmpType::IpAddress])?;
        let mut decoder = Decoder::new(self.to_bytes());
        decoder.read_ip_address().map(Ipv4Addr::from)
    }

    /// Value as a timestamp: unsigned seconds since 1970-01-01T00:00:00Z.
    pub fn to_date_time(&self) -> Result<DateTime<Utc>> {
        let seconds = self.to_u32()?;
        // Every u32 number of seconds is inside chrono's range.
        Ok(DateTime::<Utc>::from_timestamp(i64::from(seconds), 0).unwrap_or_default())
    }

    /// Value as a duration, read as TimeTicks (hundredths of a second).
    pub fn to_time_span(&self) -> Result<Duration> {
        let ticks = self.to_u32()?;
        Ok(Duration::from_millis(u64::from(ticks) * 10))
    }

    /// Value as a truth value: any nonzero integer is true.
    ///
    /// Anything that does not decode as an integer reads as false.
    pub fn to_bool(&self) -> bool {
        self.to_i32().map(|v| v != 0).unwrap_or(false)
    }

    /// Value as an OBJECT IDENTIFIER.
    pub fn to_object_identifier(&self) -> Result<Oid> {
        self.value_decoder(&[SnmpType::ObjectIdentifier])?;
        Decoder::new(self.to_bytes()).read_oid()
    }

    /// Value as raw OCTET STRING / Opaque content.
    pub fn to_octet_string(&self) -> Result<Bytes> {
        self.value_decoder(&[SnmpType::OctetString, SnmpType::Opaque])?;
        Ok(self.value.clone())
    }

    /// Value as text, replacing invalid UTF-8.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

const INTEGER_TYPES: [SnmpType; 4] = [
    SnmpType::Integer32,
    SnmpType::Gauge32,
    SnmpType::Counter32,
    SnmpType::TimeTicks,
];

/// Read any value TLV, returning its type code and content.
fn read_value(decoder: &mut Decoder) -> Result<(SnmpType, Bytes)> {
    let (tag, len) = decoder.read_header()?;
    let value = decoder.read_bytes(len)?;
    Ok((SnmpType::from_tag(tag), value))
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = ", self.identifier)?;
        match self.type_code {
            SnmpType::Integer32 => match self.to_i32() {
                Ok(v) => write!(f, "INTEGER: {}", v),
                Err(_) => write!(f, "INTEGER: <invalid>"),
            },
            SnmpType::Counter32 | SnmpType::Gauge32 | SnmpType::TimeTicks => {
                match self.to_u32() {
                    Ok(v) => write!(f, "{}: {}", self.type_code, v),
                    Err(_) => write!(f, "{}: <invalid>", self.type_code),
                }
            }
            SnmpType::Counter64 => match self.to_u64() {
                Ok(v) => write!(f, "Counter64: {}", v),
                Err(_) => write!(f, "Counter64: <invalid>"),
            },
            SnmpType::OctetString => match std::str::from_utf8(&self.value) {
                Ok(s) if !s.chars().any(|c| c.is_control() && c != '\n' && c != '\r') => {
                    write!(f, "STRING: \"{}\"", s)
                }
                _ => write!(f, "Hex-STRING: {}", HexBytes(&self.value)),
            },
            SnmpType::ObjectIdentifier => match self.to_object_identifier() {
                Ok(oid) => write!(f, "OID: {}", oid),
                Err(_) => write!(f, "OID: <invalid>"),
            },
            SnmpType::IpAddress => match self.to_ip_address() {
                Ok(ip) => write!(f, "IpAddress: {}", ip),
                Err(_) => write!(f, "IpAddress: <invalid>"),
            },
            SnmpType::Null => write!(f, "NULL"),
            other if other.is_exception() => write!(f, "{}", other),
            other => write!(f, "{}: {}", other, HexBytes(&self.value)),
        }
    }
}

struct HexBytes<'a>(&'a [u8]);

impl std::fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Encode a list of variables as the varbind `SEQUENCE OF SEQUENCE { OID, value }`.
pub fn encode_variable_list(buf: &mut EncodeBuf, variables: &[Variable]) {
    buf.push_sequence(|buf| {
        // Encode in reverse order since we're using reverse buffer
        for var in variables.iter().rev() {
            var.encode(buf);
        }
    });
}

/// Encode a list of variables to bytes.
pub fn encode_sequence(variables: &[Variable]) -> Bytes {
    let mut buf = EncodeBuf::new();
    encode_variable_list(&mut buf, variables);
    buf.finish()
}

/// Decode a varbind list, preserving wire order.
pub fn decode_variable_list(decoder: &mut Decoder) -> Result<Vec<Variable>> {
    let mut seq = decoder.read_sequence()?;
    let mut variables = Vec::new();

    while !seq.is_empty() {
        variables.push(Variable::decode(&mut seq)?);
    }

    Ok(variables)
}
