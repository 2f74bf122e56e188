#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use ntcip_snmp::pdu::Pdu;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    if let Ok(pdu) = Pdu::decode(bytes) {
        // Anything that decodes must re-encode and decode again
        let again = Pdu::decode(pdu.encode()).expect("re-encoded PDU decodes");
        assert_eq!(again.request_id, pdu.request_id);
        assert_eq!(again.bindings.len(), pdu.bindings.len());
        let _ = pdu.to_string();
    }

    let _ = Pdu::decode_framed(data);
});
