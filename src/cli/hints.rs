//! Friendly names for common NTCIP objects.
//!
//! A small fixed table for display and argument parsing, not MIB support.

use crate::Oid;

static WELL_KNOWN_OIDS: &[(&[u32], &str)] = &[
    // SNMPv2-MIB::system
    (&[1, 3, 6, 1, 2, 1, 1, 1, 0], "sysDescr.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 2, 0], "sysObjectID.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 3, 0], "sysUpTime.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 5, 0], "sysName.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 6, 0], "sysLocation.0"),
    // NTCIP 1201 global objects
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 6, 1, 1, 0], "globalSetIDParameter.0"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 6, 1, 2, 0], "globalMaxModules.0"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 6, 3, 1, 0], "globalTime.0"),
    // NTCIP 1203 sign configuration
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 1, 0], "dmsSignAccess.0"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 2, 0], "dmsSignType.0"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 3, 0], "dmsSignHeight.0"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 4, 0], "dmsSignWidth.0"),
    // Subtree roots
    (&[1, 3, 6, 1, 2, 1, 1], "system"),
    (&[1, 3, 6, 1, 4, 1, 1206], "nema"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 3], "dms"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1], "dmsSignCfg"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 6, 1], "globalConfiguration"),
    (&[1, 3, 6, 1, 4, 1, 1206, 4, 2, 6, 1, 3], "globalModuleTable"),
];

/// Look up a friendly name for an OID.
pub fn lookup(oid: &Oid) -> Option<&'static str> {
    let arcs = oid.arcs();
    WELL_KNOWN_OIDS
        .iter()
        .find(|(pattern, _)| *pattern == arcs)
        .map(|(_, name)| *name)
}

/// Parse an OID from dotted notation or a name in the table above.
pub fn parse_oid(s: &str) -> Result<Oid, String> {
    if s.chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '.')
        .unwrap_or(false)
    {
        return Oid::parse(s).map_err(|e| format!("invalid OID '{}': {}", s, e));
    }

    let lower = s.to_ascii_lowercase();
    for (arcs, name) in WELL_KNOWN_OIDS {
        if name.to_ascii_lowercase() == lower {
            return Ok(Oid::from_slice(arcs));
        }
    }

    Err(format!(
        "unknown OID name '{}'; use dotted notation (e.g., 1.3.6.1.4.1.1206.4.2.3.1.2.0)",
        s
    ))
}
