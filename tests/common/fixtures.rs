//! Common test fixtures: NTCIP object identifiers and a simulated agent.

use std::collections::BTreeMap;

use bytes::Bytes;
use ntcip_snmp::ber::SnmpType;
use ntcip_snmp::pmpp::{self, PmppEndPoint};
use ntcip_snmp::{ErrorStatus, Oid, Pdu, PduType, Variable, Version, oid};

// =============================================================================
// System group (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}

// =============================================================================
// NTCIP 1201 / 1203 objects
// =============================================================================

pub fn global_time() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 6, 3, 1, 0)
}
pub fn module_make(row: u32) -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 6, 1, 3, 1, 3, row)
}
pub fn dms_sign_type() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 2, 0)
}
pub fn dms_sign_height() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 3, 0)
}
pub fn dms_sign_width() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 4, 0)
}
pub fn dms_message_status() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 6, 17, 0)
}

/// dmsSignCfg subtree root.
pub fn dms_sign_cfg() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1)
}

/// Not implemented by the simulated agent.
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 99, 0)
}

pub const COMMUNITY: &str = "public";

/// The objects a small sign controller exposes.
pub fn sign_controller_table() -> BTreeMap<Oid, Variable> {
    [
        Variable::octet_string(sys_descr(), b"NTCIP 1203 DMS controller"),
        Variable::unsigned32(sys_uptime(), SnmpType::TimeTicks, 360_000),
        Variable::octet_string(module_make(1), b"ACME Signs"),
        Variable::octet_string(module_make(2), b"ACME Controls"),
        Variable::integer32(dms_sign_type(), 6),
        Variable::integer32(dms_sign_height(), 1800),
        Variable::integer32(dms_sign_width(), 7200),
        Variable::integer32(dms_message_status(), 7),
        Variable::unsigned32(global_time(), SnmpType::Counter32, 1_700_000_000),
    ]
    .into_iter()
    .map(|v| (v.identifier.clone(), v))
    .collect()
}

// =============================================================================
// Simulated agent
// =============================================================================

/// In-memory agent answering GET, GETNEXT and SET from a table.
///
/// With an endpoint set, requests and responses are PMPP frames and the
/// agent ignores frames addressed to other stations.
pub struct SimAgent {
    pub table: BTreeMap<Oid, Variable>,
    pub endpoint: Option<PmppEndPoint>,
}

impl SimAgent {
    pub fn new(endpoint: Option<PmppEndPoint>) -> Self {
        Self {
            table: sign_controller_table(),
            endpoint,
        }
    }

    /// Answer one request message, or `None` when it is not for us.
    pub fn handle(&mut self, data: &[u8]) -> Option<Bytes> {
        let request = match &self.endpoint {
            Some(endpoint) => {
                let unframed = pmpp::decode(data, false).ok()?;
                let header = unframed.header?;
                if header.address != endpoint.address {
                    return None;
                }
                Pdu::decode(unframed.payload).ok()?
            }
            None => Pdu::decode(Bytes::copy_from_slice(data)).ok()?,
        };
        let response = self.respond(&request);
        Some(response.to_packet(self.endpoint.as_ref()))
    }

    pub fn respond(&mut self, request: &Pdu) -> Pdu {
        let mut response = request.clone();
        response.pdu_type = PduType::Response;

        for (i, binding) in request.bindings.iter().enumerate() {
            let found = match request.pdu_type {
                PduType::GetRequest => self.table.get(&binding.identifier).cloned(),
                PduType::GetNextRequest => self
                    .table
                    .range(binding.identifier.clone()..)
                    .find(|(oid, _)| **oid > binding.identifier)
                    .map(|(_, v)| v.clone()),
                PduType::SetRequest => {
                    if self.table.contains_key(&binding.identifier) {
                        self.table.insert(binding.identifier.clone(), binding.clone());
                        Some(binding.clone())
                    } else {
                        None
                    }
                }
                _ => None,
            };

            match found {
                Some(var) => response.bindings[i] = var,
                None if request.version == Version::V1 => {
                    response.error_status = ErrorStatus::NoSuchName;
                    response.error_index = i as i32 + 1;
                    response.bindings = request.bindings.clone();
                    return response;
                }
                None => {
                    let exception = if request.pdu_type == PduType::GetNextRequest {
                        SnmpType::EndOfMibView
                    } else {
                        SnmpType::NoSuchObject
                    };
                    response.bindings[i] =
                        Variable::new(binding.identifier.clone(), exception, Bytes::new());
                }
            }
        }
        response
    }
}

/// Frame `payload` like [`pmpp::encode`] but with a wrong FCS.
pub fn frame_with_bad_fcs(payload: &[u8], endpoint: &PmppEndPoint) -> Bytes {
    let mut body = Vec::new();
    body.extend_from_slice(endpoint.address.as_bytes());
    body.push(endpoint.control);
    body.extend_from_slice(endpoint.protocol_identifier.as_bytes());
    body.extend_from_slice(payload);
    let fcs = pmpp::fcs16(&body) ^ 0xFFFF;
    body.extend_from_slice(&fcs.to_le_bytes());

    let mut frame = vec![0x7E];
    frame.extend_from_slice(&pmpp::stuff(&body));
    frame.push(0x7E);
    Bytes::from(frame)
}
