//! SNMP version enumeration.

/// SNMP protocol version.
///
/// Only the community-based message layout is encoded. `V3` exists so that
/// a version field of 3 round-trips; no USM processing is done for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Version {
    /// SNMPv1 (RFC 1157). NTCIP devices speak this.
    #[default]
    V1,
    /// SNMPv2c (RFC 1901)
    V2c,
    /// SNMPv3 (RFC 3411-3418)
    V3,
}

impl Version {
    /// Get the BER-encoded version number.
    pub const fn as_i32(self) -> i32 {
        match self {
            Version::V1 => 0,
            Version::V2c => 1,
            Version::V3 => 3,
        }
    }

    /// Create from BER-encoded version number.
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Version::V1),
            1 => Some(Version::V2c),
            3 => Some(Version::V3),
            _ => None,
        }
    }

    /// Create from a human version number, clamping out-of-range values.
    ///
    /// `1` and anything below is v1, `2` is v2c, `3` and anything above is v3.
    pub const fn from_number(number: i32) -> Self {
        match number {
            i32::MIN..=1 => Version::V1,
            2 => Version::V2c,
            _ => Version::V3,
        }
    }

    /// The human version number (1, 2 or 3).
    pub const fn number(self) -> i32 {
        match self {
            Version::V1 => 1,
            Version::V2c => 2,
            Version::V3 => 3,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "SNMPv1"),
            Version::V2c => write!(f, "SNMPv2c"),
            Version::V3 => write!(f, "SNMPv3"),
        }
    }
}
