//! SNMP protocol data units and community messages.
//!
//! A [`Pdu`] is one complete v1/v2c message:
//!
//! ```text
//! SEQUENCE {
//!     version    INTEGER,
//!     community  OCTET STRING,
//!     [pdu-type] {
//!         request-id   INTEGER,
//!         error-status INTEGER,   -- non-repeaters for GetBulk
//!         error-index  INTEGER,   -- max-repetitions for GetBulk
//!         SEQUENCE OF SEQUENCE { OID, value }
//!     }
//! }
//! ```

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::pmpp::{self, PmppEndPoint};
use crate::variable::{Variable, decode_variable_list, encode_variable_list};
use crate::version::Version;

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    Response,
    SetRequest,
    /// SNMPv1 trap. Its body has a different layout and is not decoded.
    TrapV1,
    GetBulkRequest,
    InformRequest,
    TrapV2,
    Report,
}

impl PduType {
    /// The context-specific constructed tag for this type.
    pub const fn tag(self) -> u8 {
        match self {
            Self::GetRequest => tag::pdu::GET_REQUEST,
            Self::GetNextRequest => tag::pdu::GET_NEXT_REQUEST,
            Self::Response => tag::pdu::RESPONSE,
            Self::SetRequest => tag::pdu::SET_REQUEST,
            Self::TrapV1 => tag::pdu::TRAP_V1,
            Self::GetBulkRequest => tag::pdu::GET_BULK_REQUEST,
            Self::InformRequest => tag::pdu::INFORM_REQUEST,
            Self::TrapV2 => tag::pdu::TRAP_V2,
            Self::Report => tag::pdu::REPORT,
        }
    }

    /// Look up a PDU type by tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            tag::pdu::GET_REQUEST => Some(Self::GetRequest),
            tag::pdu::GET_NEXT_REQUEST => Some(Self::GetNextRequest),
            tag::pdu::RESPONSE => Some(Self::Response),
            tag::pdu::SET_REQUEST => Some(Self::SetRequest),
            tag::pdu::TRAP_V1 => Some(Self::TrapV1),
            tag::pdu::GET_BULK_REQUEST => Some(Self::GetBulkRequest),
            tag::pdu::INFORM_REQUEST => Some(Self::InformRequest),
            tag::pdu::TRAP_V2 => Some(Self::TrapV2),
            tag::pdu::REPORT => Some(Self::Report),
            _ => None,
        }
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GetRequest => "GetRequest",
            Self::GetNextRequest => "GetNextRequest",
            Self::Response => "Response",
            Self::SetRequest => "SetRequest",
            Self::TrapV1 => "Trap",
            Self::GetBulkRequest => "GetBulkRequest",
            Self::InformRequest => "InformRequest",
            Self::TrapV2 => "SNMPv2-Trap",
            Self::Report => "Report",
        };
        f.write_str(name)
    }
}

/// One SNMP v1/v2c message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub version: Version,
    pub community: String,
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: ErrorStatus,
    pub error_index: i32,
    /// Bindings in wire order.
    pub bindings: Vec<Variable>,
}

impl Pdu {
    /// Create an empty PDU of the given type.
    pub fn new(version: Version, community: impl Into<String>, pdu_type: PduType) -> Self {
        Self {
            version,
            community: community.into(),
            pdu_type,
            request_id: 0,
            error_status: ErrorStatus::NoError,
            error_index: 0,
            bindings: Vec::new(),
        }
    }

    fn with_nulls(
        version: Version,
        community: impl Into<String>,
        pdu_type: PduType,
        oids: &[Oid],
    ) -> Self {
        let mut pdu = Self::new(version, community, pdu_type);
        pdu.bindings = oids.iter().cloned().map(Variable::null).collect();
        pdu
    }

    /// GET request with NULL values.
    pub fn get_request(version: Version, community: impl Into<String>, oids: &[Oid]) -> Self {
        Self::with_nulls(version, community, PduType::GetRequest, oids)
    }

    /// GETNEXT request with NULL values.
    pub fn get_next_request(version: Version, community: impl Into<String>, oids: &[Oid]) -> Self {
        Self::with_nulls(version, community, PduType::GetNextRequest, oids)
    }

    /// SET request.
    pub fn set_request(
        version: Version,
        community: impl Into<String>,
        bindings: Vec<Variable>,
    ) -> Self {
        let mut pdu = Self::new(version, community, PduType::SetRequest);
        pdu.bindings = bindings;
        pdu
    }

    /// GETBULK request. Non-repeaters and max-repetitions travel in the
    /// error-status and error-index slots; negative values are sent as 0.
    pub fn get_bulk_request(
        version: Version,
        community: impl Into<String>,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        let mut pdu = Self::with_nulls(version, community, PduType::GetBulkRequest, oids);
        pdu.error_status = ErrorStatus::from_i32(non_repeaters.max(0));
        pdu.error_index = max_repetitions.max(0);
        pdu
    }

    /// Set the request id. Negative ids are stored as 0.
    pub fn set_request_id(&mut self, request_id: i32) {
        self.request_id = request_id.max(0);
    }

    /// Builder form of [`Pdu::set_request_id`].
    pub fn with_request_id(mut self, request_id: i32) -> Self {
        self.set_request_id(request_id);
        self
    }

    /// GetBulk non-repeaters (the error-status slot).
    pub fn non_repeaters(&self) -> i32 {
        self.error_status.as_i32()
    }

    /// GetBulk max-repetitions (the error-index slot).
    pub fn max_repetitions(&self) -> i32 {
        self.error_index
    }

    /// True if the agent reported an error.
    pub fn is_error(&self) -> bool {
        self.pdu_type != PduType::GetBulkRequest && self.error_status != ErrorStatus::NoError
    }

    /// Turn an error response into [`Error::Snmp`], naming the failing binding.
    pub fn check_error(&self) -> Result<()> {
        if !self.is_error() {
            return Ok(());
        }
        let index = self.error_index.max(0) as u32;
        let oid = index
            .checked_sub(1)
            .and_then(|i| self.bindings.get(i as usize))
            .map(|var| var.identifier.clone());
        Err(Error::Snmp {
            status: self.error_status,
            index,
            oid,
        })
    }

    /// Check that every binding's OID can be encoded faithfully.
    pub fn validate(&self) -> Result<()> {
        self.bindings.iter().try_for_each(Variable::validate)
    }

    /// Encode the PDU body (type tag onward) into `buf`.
    pub fn encode_pdu(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_variable_list(buf, &self.bindings);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status.as_i32());
            buf.push_integer(self.request_id);
        });
    }

    /// The PDU body alone (type tag onward).
    pub fn to_pdu(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        self.encode_pdu(&mut buf);
        buf.finish()
    }

    /// The full message.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.encode_pdu(buf);
            buf.push_octet_string(self.community.as_bytes());
            buf.push_integer(self.version.as_i32());
        });
        buf.finish()
    }

    /// The full message, PMPP framed when an endpoint is given.
    pub fn to_packet(&self, endpoint: Option<&PmppEndPoint>) -> Bytes {
        let message = self.encode();
        match endpoint {
            Some(endpoint) => pmpp::encode(&message, endpoint),
            None => message,
        }
    }

    /// Decode a full message.
    ///
    /// Bytes after the outer SEQUENCE are ignored; nothing past its declared
    /// length is read.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        Self::decode_from(&mut decoder)
    }

    /// Decode a full message at the decoder's position.
    pub fn decode_from(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;

        let version_offset = seq.offset();
        let version_num = seq.read_integer()?;
        let version = Version::from_i32(version_num).ok_or_else(|| {
            let kind = DecodeErrorKind::UnknownVersion(version_num);
            tracing::debug!(target: "ntcip_snmp::ber", { snmp.offset = version_offset, kind = %kind }, "decode error");
            Error::decode(version_offset, kind)
        })?;

        let community = seq.read_octet_string()?;
        let community = String::from_utf8_lossy(&community).into_owned();

        let pdu_offset = seq.offset();
        let pdu_tag = seq.peek_tag().ok_or_else(|| {
            Error::decode(pdu_offset, DecodeErrorKind::TruncatedData)
        })?;
        let pdu_type = match PduType::from_tag(pdu_tag) {
            Some(t) if t != PduType::TrapV1 => t,
            _ => {
                let kind = DecodeErrorKind::UnknownPduType(pdu_tag);
                tracing::debug!(target: "ntcip_snmp::ber", { snmp.offset = pdu_offset, kind = %kind }, "decode error");
                return Err(Error::decode(pdu_offset, kind));
            }
        };

        let mut body = seq.read_constructed(pdu_tag)?;
        let request_id = body.read_integer()?;
        let error_status = ErrorStatus::from_i32(body.read_integer()?);
        let error_index = body.read_integer()?;

        // Some agents omit the binding list entirely in error responses
        let bindings = if body.is_empty() {
            Vec::new()
        } else {
            decode_variable_list(&mut body)?
        };

        Ok(Self {
            version,
            community,
            pdu_type,
            request_id,
            error_status,
            error_index,
            bindings,
        })
    }

    /// Unframe a PMPP frame and decode the message inside.
    ///
    /// Returns the FCS outcome alongside so the caller can count mismatches.
    pub fn decode_framed(frame: &[u8]) -> Result<(Self, pmpp::Unframed)> {
        let unframed = pmpp::decode(frame, false)?;
        let pdu = Self::decode(unframed.payload.clone())?;
        Ok((pdu, unframed))
    }
}

impl std::fmt::Display for Pdu {
    /// JSON-like diagnostic dump.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{{")?;
        writeln!(f, "  \"Version\": {},", self.version.number())?;
        writeln!(f, "  \"CommunityName\": {:?},", self.community)?;
        writeln!(f, "  \"PduType\": \"{}\",", self.pdu_type)?;
        writeln!(f, "  \"RequestId\": {},", self.request_id)?;
        writeln!(f, "  \"ErrorStatus\": \"{}\",", self.error_status)?;
        writeln!(f, "  \"ErrorIndex\": {},", self.error_index)?;
        write!(f, "  \"Bindings\": [")?;
        for (i, var) in self.bindings.iter().enumerate() {
            let sep = if i + 1 < self.bindings.len() { "," } else { "" };
            write!(f, "\n    {:?}{}", var.to_string(), sep)?;
        }
        if !self.bindings.is_empty() {
            write!(f, "\n  ")?;
        }
        writeln!(f, "]")?;
        write!(f, "}}")
    }
}
