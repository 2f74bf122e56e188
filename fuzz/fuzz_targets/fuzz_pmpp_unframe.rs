#![no_main]

use libfuzzer_sys::fuzz_target;

use ntcip_snmp::pmpp::{self, PmppEndPoint};

fuzz_target!(|data: &[u8]| {
    let _ = pmpp::decode(data, true);

    assert_eq!(pmpp::unstuff(&pmpp::stuff(data)), data);

    // Arbitrary payloads survive framing for the default station
    let frame = pmpp::encode(data, &PmppEndPoint::NTCIP_DEFAULT);
    let unframed = pmpp::decode(&frame, false).expect("own frame decodes");
    assert!(!unframed.crc_error());
    assert_eq!(&unframed.payload[..], data);
});
