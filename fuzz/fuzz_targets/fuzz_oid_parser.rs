#![no_main]

use libfuzzer_sys::fuzz_target;

use ntcip_snmp::oid::Oid;

fuzz_target!(|data: &[u8]| {
    if let Ok(oid) = Oid::from_ber(data) {
        // Whatever decodes must encode back to the same arcs
        if oid.validate().is_ok() {
            let again = Oid::from_ber(&oid.to_ber()).expect("re-encoded OID decodes");
            assert_eq!(again, oid);
        }
    }

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(oid) = Oid::parse(s) {
            assert_eq!(Oid::parse(&oid.to_string()).ok(), Some(oid));
        }
    }
});
