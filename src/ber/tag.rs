//! BER tag definitions for SNMP.
//!
//! Tag encoding follows X.690 Section 8.1.2:
//! - Bits 7-6: Class (00=Universal, 01=Application, 10=Context-specific, 11=Private)
//! - Bit 5: Primitive (0) or Constructed (1)
//! - Bits 4-0: Tag number (0-30, or 31 for long form)

/// Tag class bits (bits 7-6)
pub mod class {
    pub const UNIVERSAL: u8 = 0x00;
    pub const APPLICATION: u8 = 0x40;
    pub const CONTEXT_SPECIFIC: u8 = 0x80;
}

/// Constructed bit (bit 5)
pub const CONSTRUCTED: u8 = 0x20;

/// Universal tags (class bits 00)
pub mod universal {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30; // Constructed
}

/// Application tags (class bits 01) - SNMP-specific types
pub mod application {
    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    pub const GAUGE32: u8 = 0x42; // Also Unsigned32
    pub const TIMETICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;
}

/// Context-specific tags (class bits 10) - Exception values
pub mod context {
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;
}

/// PDU tags (context-specific, constructed)
pub mod pdu {
    use super::CONSTRUCTED;
    use super::class::CONTEXT_SPECIFIC;

    pub const GET_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED; // 0xA0
    pub const GET_NEXT_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x01; // 0xA1
    pub const RESPONSE: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x02; // 0xA2
    pub const SET_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x03; // 0xA3
    pub const TRAP_V1: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x04; // 0xA4
    pub const GET_BULK_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x05; // 0xA5
    pub const INFORM_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x06; // 0xA6
    pub const TRAP_V2: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x07; // 0xA7
    pub const REPORT: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x08; // 0xA8
}

/// Check if a tag indicates a constructed type
#[inline]
pub const fn is_constructed(tag: u8) -> bool {
    tag & CONSTRUCTED != 0
}

/// Get the class of a tag
#[inline]
pub const fn tag_class(tag: u8) -> u8 {
    tag & 0xC0
}

/// SNMP type code carried in the tag byte of a TLV.
///
/// Covers the ASN.1 universal types SNMP uses, the SMI application types,
/// the SNMPv2 exception markers, and the PDU tags. Tags outside this set
/// are kept as [`SnmpType::Unknown`] so that foreign packets still decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnmpType {
    Integer32,
    OctetString,
    Null,
    ObjectIdentifier,
    Sequence,
    IpAddress,
    Counter32,
    /// Gauge32, also known as Unsigned32 / UInteger32.
    Gauge32,
    TimeTicks,
    Opaque,
    Counter64,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    GetRequestPdu,
    GetNextRequestPdu,
    ResponsePdu,
    SetRequestPdu,
    TrapPdu,
    GetBulkRequestPdu,
    InformRequestPdu,
    TrapV2Pdu,
    ReportPdu,
    Unknown(u8),
}

impl SnmpType {
    /// Alias for [`SnmpType::Gauge32`].
    pub const UINTEGER32: SnmpType = SnmpType::Gauge32;

    /// Map a tag byte to its type code.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            universal::INTEGER => Self::Integer32,
            universal::OCTET_STRING => Self::OctetString,
            universal::NULL => Self::Null,
            universal::OBJECT_IDENTIFIER => Self::ObjectIdentifier,
            universal::SEQUENCE => Self::Sequence,
            application::IP_ADDRESS => Self::IpAddress,
            application::COUNTER32 => Self::Counter32,
            application::GAUGE32 => Self::Gauge32,
            application::TIMETICKS => Self::TimeTicks,
            application::OPAQUE => Self::Opaque,
            application::COUNTER64 => Self::Counter64,
            context::NO_SUCH_OBJECT => Self::NoSuchObject,
            context::NO_SUCH_INSTANCE => Self::NoSuchInstance,
            context::END_OF_MIB_VIEW => Self::EndOfMibView,
            pdu::GET_REQUEST => Self::GetRequestPdu,
            pdu::GET_NEXT_REQUEST => Self::GetNextRequestPdu,
            pdu::RESPONSE => Self::ResponsePdu,
            pdu::SET_REQUEST => Self::SetRequestPdu,
            pdu::TRAP_V1 => Self::TrapPdu,
            pdu::GET_BULK_REQUEST => Self::GetBulkRequestPdu,
            pdu::INFORM_REQUEST => Self::InformRequestPdu,
            pdu::TRAP_V2 => Self::TrapV2Pdu,
            pdu::REPORT => Self::ReportPdu,
            other => Self::Unknown(other),
        }
    }

    /// The tag byte for this type code.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Integer32 => universal::INTEGER,
            Self::OctetString => universal::OCTET_STRING,
            Self::Null => universal::NULL,
            Self::ObjectIdentifier => universal::OBJECT_IDENTIFIER,
            Self::Sequence => universal::SEQUENCE,
            Self::IpAddress => application::IP_ADDRESS,
            Self::Counter32 => application::COUNTER32,
            Self::Gauge32 => application::GAUGE32,
            Self::TimeTicks => application::TIMETICKS,
            Self::Opaque => application::OPAQUE,
            Self::Counter64 => application::COUNTER64,
            Self::NoSuchObject => context::NO_SUCH_OBJECT,
            Self::NoSuchInstance => context::NO_SUCH_INSTANCE,
            Self::EndOfMibView => context::END_OF_MIB_VIEW,
            Self::GetRequestPdu => pdu::GET_REQUEST,
            Self::GetNextRequestPdu => pdu::GET_NEXT_REQUEST,
            Self::ResponsePdu => pdu::RESPONSE,
            Self::SetRequestPdu => pdu::SET_REQUEST,
            Self::TrapPdu => pdu::TRAP_V1,
            Self::GetBulkRequestPdu => pdu::GET_BULK_REQUEST,
            Self::InformRequestPdu => pdu::INFORM_REQUEST,
            Self::TrapV2Pdu => pdu::TRAP_V2,
            Self::ReportPdu => pdu::REPORT,
            Self::Unknown(tag) => tag,
        }
    }

    /// True for the SNMPv2 exception markers (noSuchObject, noSuchInstance, endOfMibView).
    pub const fn is_exception(self) -> bool {
        matches!(
            self,
            Self::NoSuchObject | Self::NoSuchInstance | Self::EndOfMibView
        )
    }

    /// True for the unsigned 32-bit application types.
    pub const fn is_unsigned32(self) -> bool {
        matches!(self, Self::Counter32 | Self::Gauge32 | Self::TimeTicks)
    }
}

impl From<u8> for SnmpType {
    fn from(tag: u8) -> Self {
        Self::from_tag(tag)
    }
}

impl From<SnmpType> for u8 {
    fn from(ty: SnmpType) -> Self {
        ty.tag()
    }
}

impl std::fmt::Display for SnmpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer32 => write!(f, "INTEGER"),
            Self::OctetString => write!(f, "OCTET STRING"),
            Self::Null => write!(f, "NULL"),
            Self::ObjectIdentifier => write!(f, "OBJECT IDENTIFIER"),
            Self::Sequence => write!(f, "SEQUENCE"),
            Self::IpAddress => write!(f, "IpAddress"),
            Self::Counter32 => write!(f, "Counter32"),
            Self::Gauge32 => write!(f, "Gauge32"),
            Self::TimeTicks => write!(f, "TimeTicks"),
            Self::Opaque => write!(f, "Opaque"),
            Self::Counter64 => write!(f, "Counter64"),
            Self::NoSuchObject => write!(f, "noSuchObject"),
            Self::NoSuchInstance => write!(f, "noSuchInstance"),
            Self::EndOfMibView => write!(f, "endOfMibView"),
            Self::GetRequestPdu => write!(f, "GetRequest-PDU"),
            Self::GetNextRequestPdu => write!(f, "GetNextRequest-PDU"),
            Self::ResponsePdu => write!(f, "Response-PDU"),
            Self::SetRequestPdu => write!(f, "SetRequest-PDU"),
            Self::TrapPdu => write!(f, "Trap-PDU"),
            Self::GetBulkRequestPdu => write!(f, "GetBulkRequest-PDU"),
            Self::InformRequestPdu => write!(f, "InformRequest-PDU"),
            Self::TrapV2Pdu => write!(f, "SNMPv2-Trap-PDU"),
            Self::ReportPdu => write!(f, "Report-PDU"),
            Self::Unknown(tag) => write!(f, "unknown(0x{:02X})", tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for tag in 0..=u8::MAX {
            assert_eq!(SnmpType::from_tag(tag).tag(), tag);
        }
    }

    #[test]
    fn test_pdu_tags_constructed() {
        assert!(is_constructed(pdu::GET_REQUEST));
        assert!(is_constructed(universal::SEQUENCE));
        assert!(!is_constructed(universal::INTEGER));
        assert_eq!(tag_class(pdu::RESPONSE), class::CONTEXT_SPECIFIC);
        assert_eq!(tag_class(application::GAUGE32), class::APPLICATION);
    }

    #[test]
    fn test_uinteger32_alias() {
        assert_eq!(SnmpType::UINTEGER32.tag(), 0x42);
        assert!(SnmpType::UINTEGER32.is_unsigned32());
        assert!(SnmpType::EndOfMibView.is_exception());
        assert!(!SnmpType::Null.is_exception());
    }
}
